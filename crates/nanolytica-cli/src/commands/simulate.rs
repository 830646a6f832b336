use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use nanolytica_core::error::Result;
use nanolytica_core::simulation::{self, Scenario, SimulationReport};
use nanolytica_core::transmitter::{recording_transmitter, BeaconMode, RecordingChannel};
use nanolytica_core::transport::http_transmitter;
use tracing::{debug, info};

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (TOML)
    scenario: PathBuf,
    /// Override the page's script src, e.g. to point at a local collector
    #[arg(long)]
    script_src: Option<String>,
    /// Record payloads instead of sending them
    #[arg(long)]
    dry_run: bool,
    /// With --dry-run, refuse every beacon so payloads take the fallback
    #[arg(long, requires = "dry_run")]
    reject_beacon: bool,
    /// How long to let in-flight deliveries finish before exiting
    #[arg(long, default_value = "500")]
    grace_ms: u64,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn load(args: &SimulateArgs) -> Result<Scenario> {
    let mut scenario = Scenario::load(&args.scenario)?;
    if let Some(src) = &args.script_src {
        scenario.page.script_src = Some(src.clone());
    }
    Ok(scenario)
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let scenario = load(&args)?;
    info!(
        scenario = %scenario.name,
        dry_run = args.dry_run,
        "replaying scenario"
    );

    let report = if args.dry_run {
        let mode = if args.reject_beacon {
            BeaconMode::Reject
        } else {
            BeaconMode::Accept
        };
        simulation::run(&scenario, recording_transmitter(&RecordingChannel::new(mode)))
    } else {
        let runtime = tokio::runtime::Runtime::new()?;
        let report = {
            let _guard = runtime.enter();
            let transmitter = http_transmitter(&scenario.options)?;
            simulation::run(&scenario, transmitter)
        };
        debug!(grace_ms = args.grace_ms, "waiting for in-flight deliveries");
        runtime.block_on(tokio::time::sleep(Duration::from_millis(args.grace_ms)));
        report
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &SimulationReport) {
    println!("Scenario: {}", report.scenario);
    println!("Endpoint: {}", report.config.endpoint);
    if report.config.do_not_track {
        println!("Do-not-track: on (nothing sent)");
    }
    println!("Transmissions: {}", report.transmissions.len());
    for t in &report.transmissions {
        println!(
            "  {:>7}ms  {:<10} {:>4}s  {:<8} {}",
            t.at_ms,
            format!("{:?}", t.kind),
            t.measurement.duration_sec,
            format!("{:?}", t.route),
            t.measurement.path,
        );
    }
    if report.skipped_steps > 0 || report.dropped_deferred > 0 {
        println!(
            "After teardown: {} step(s) skipped, {} deferred task(s) dropped",
            report.skipped_steps, report.dropped_deferred
        );
    }
}
