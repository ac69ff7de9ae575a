use crate::app::dto::{DetectResponse, GraphSnapshot, PolicyKind, ResolveRequest};
use crate::app::service::EngineService;
use crate::domain::engine::GraphState;
use anyhow::Result;
use serde::Serialize;

/// Victim policy as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    Personality,
    Youngest,
    MinCost,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Personality => PolicyKind::Personality,
            PolicyArg::Youngest => PolicyKind::Youngest,
            PolicyArg::MinCost => PolicyKind::MinCost,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn display_detection(service: &EngineService, json: bool) -> Result<()> {
    let result = service.detect()?;
    if json {
        return print_json(&result);
    }

    println!("Analyzing resource allocation graph...");
    print_detection(&result);
    Ok(())
}

fn print_detection(result: &DetectResponse) {
    if !result.report.is_deadlocked() {
        println!("No circular wait found. Graph is stable.");
        println!("Risk: {}% ({:?})", result.risk.score, result.risk.level);
        return;
    }

    println!(
        "Deadlock detected! {} process(es) on {} cycle(s):",
        result.report.members.len(),
        result.report.cycles.len()
    );
    for (i, cycle) in result.report.cycles.iter().enumerate() {
        let mut path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        if let Some(first) = cycle.first() {
            path.push(first.to_string());
        }
        println!("  {}. {}", i + 1, path.join(" -> "));
    }
    println!("Risk: {}%", result.risk.score);
}

pub fn run_resolution(
    service: &EngineService,
    policy: Option<PolicyKind>,
    all: bool,
    json: bool,
) -> Result<()> {
    let detected = service.detect()?;
    if detected.state == GraphState::Stable {
        if json {
            return print_json(&detected);
        }
        println!("No deadlock present.");
        return Ok(());
    }

    let result = service.resolve(ResolveRequest { policy, all })?;
    if json {
        return print_json(&result);
    }

    print_detection(&detected);
    println!("\nEvaluating processes ({:?} policy)...", result.policy);
    for victim in &result.victims {
        println!("  Terminated {victim}");
    }
    match result.state {
        GraphState::Stable => println!("Deadlock resolved."),
        GraphState::Deadlocked => println!(
            "Deadlock persists: {} process(es) still on a cycle.",
            result.report.members.len()
        ),
    }
    Ok(())
}

pub fn display_risk(service: &EngineService, json: bool) -> Result<()> {
    let risk = service.risk()?;
    if json {
        return print_json(&risk);
    }
    println!("Risk: {}% ({:?})", risk.score, risk.level);
    if risk.score >= 70 {
        println!("High risk of deadlock. Consider running `detect`.");
    }
    Ok(())
}

pub fn display_graph(service: &EngineService, json: bool) -> Result<()> {
    let snapshot = service.snapshot()?;
    if json {
        return print_json(&snapshot);
    }
    print_graph(&snapshot);
    Ok(())
}

fn print_graph(snapshot: &GraphSnapshot) {
    println!("State: {:?}", snapshot.state);
    println!("{}", "=".repeat(60));

    println!("Processes ({}):", snapshot.processes.len());
    for p in &snapshot.processes {
        let marker = if p.in_deadlock { " [DEADLOCKED]" } else { "" };
        println!("  {} ({}){}", p.label, p.personality, marker);
        if !p.holds.is_empty() {
            println!("    holds:    {}", join(&p.holds));
        }
        if !p.waits_on.is_empty() {
            println!("    waits on: {}", join(&p.waits_on));
        }
    }

    println!("\nResources ({}):", snapshot.resources.len());
    for r in &snapshot.resources {
        match r.holder {
            Some(holder) => println!("  {} held by {}", r.label, holder),
            None => println!("  {} free", r.label),
        }
    }

    if !snapshot.wait_for.is_empty() {
        println!("\nWait-for edges:");
        for e in &snapshot.wait_for {
            println!("  {} -> {}", e.waiter, e.holder);
        }
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
