use std::path::PathBuf;

use clap::Args;
use nanolytica_core::config;
use nanolytica_core::Scenario;
use serde_json::json;

#[derive(Args)]
pub struct ConfigArgs {
    /// Scenario file (TOML) whose page and options are resolved
    scenario: PathBuf,
}

pub fn run(args: ConfigArgs) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&args.scenario)?;
    let resolved = config::resolve(&scenario.page, &scenario.options);
    let out = json!({
        "configuration": resolved,
        "options": scenario.options,
        "swap_listener": !resolved.do_not_track && scenario.page.swap_framework,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
