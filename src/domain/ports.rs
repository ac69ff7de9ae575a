use crate::domain::scenario::Scenario;
use anyhow::Result;

/// Scenario source port (implemented by Infrastructure)
pub trait ScenarioSource {
    fn load(&self) -> Result<Scenario>;
}
