use crate::domain::ports::ScenarioSource;
use crate::domain::scenario::Scenario;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File system scenario source (JSON)
pub struct JsonScenarioFile {
    path: PathBuf,
}

impl JsonScenarioFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScenarioSource for JsonScenarioFile {
    fn load(&self) -> Result<Scenario> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read scenario file: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scenario JSON: {}", self.path.display()))
    }
}
