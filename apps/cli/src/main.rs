#![deny(warnings)]

//! Headless CLI: build a freight world, run the day loop and report KPIs.

use anyhow::{bail, Context, Result};
use sim_core::{DispatchPolicyKind, SimConfig};
use sim_runtime::{run_days_in_place, Command, Engine, Scenario};
use std::fs;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<String>,
    config: Option<String>,
    script: Option<String>,
    days: Option<u32>,
    seed: Option<u64>,
    policy: Option<DispatchPolicyKind>,
    json: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => out.scenario = it.next(),
            "--config" => out.config = it.next(),
            "--script" => out.script = it.next(),
            "--days" => out.days = it.next().and_then(|s| s.parse().ok()),
            "--seed" => out.seed = it.next().and_then(|s| s.parse().ok()),
            "--policy" => {
                out.policy = match it.next().as_deref() {
                    Some("first") => Some(DispatchPolicyKind::FirstAvailable),
                    Some("nearest") => Some(DispatchPolicyKind::NearestTruck),
                    other => bail!("unknown policy {other:?}, expected first|nearest"),
                }
            }
            "--json" => out.json = true,
            _ => {}
        }
    }
    Ok(out)
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    if let Some(policy) = args.policy {
        cfg.dispatch = policy;
    }
    Ok(cfg)
}

fn load_scenario(args: &Args) -> Result<Scenario> {
    match &args.scenario {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Ok(Scenario::from_yaml(&text)?)
        }
        None => Ok(Scenario::demo()),
    }
}

/// Apply scripted commands; recoverable failures are logged and skipped.
fn run_script(engine: &mut Engine, path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let commands: Vec<Command> =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {path}"))?;
    for cmd in commands {
        match engine.apply(cmd.clone()) {
            Ok(outcome) => info!(?cmd, ?outcome, "command applied"),
            Err(e) if e.is_recoverable() => warn!(?cmd, error = %e, "command rejected"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(?args, "starting CLI");

    let cfg = load_config(&args)?;
    let scenario = load_scenario(&args)?;
    let mut engine = Engine::from_scenario(&scenario, cfg)?;
    println!(
        "World OK | nodes: {} | edges: {} | trucks: {} | orders: {}",
        engine.list_nodes().len(),
        engine.list_edges().len(),
        engine.list_trucks().len(),
        engine.list_orders().len()
    );

    if let Some(path) = &args.script {
        run_script(&mut engine, path)?;
    }

    let days = args.days.unwrap_or(engine.config().total_days);
    let snap = run_days_in_place(&mut engine, days)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }
    let stranded = snap
        .trucks
        .iter()
        .filter(|t| t.status == sim_core::TruckStatus::Stranded)
        .count();
    println!(
        "KPI | day: {}/{} | money: ${} | profit: ${} | deliveries: {} | open orders: {} | trucks: {} | stranded: {}",
        snap.day.min(snap.total_days),
        snap.total_days,
        snap.money,
        snap.profit,
        snap.deliveries,
        snap.orders.len(),
        snap.trucks.len(),
        stranded
    );
    for t in &snap.trucks {
        println!(
            "  {} @ {} | {:?} | fuel {:.1}/{:.1} | driven {:.0}",
            t.name, t.node, t.status, t.fuel, t.fuel_capacity, t.odometer
        );
    }
    if snap.game_over {
        println!("GAME OVER | final money: ${} | profit: ${}", snap.money, snap.profit);
    }

    Ok(())
}
