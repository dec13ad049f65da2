use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;

use homeval_cli::cli::build_cli;
use homeval_cli::serve::{input::ServeConfig, run_server};
use homeval_cli::train::{input::TrainConfig, trainer};
use homeval_cli::ui::{input::UiConfig, run_ui};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(
            "HOMEVAL_LOG",
            "error,homeval=info,homeval_core=info,homeval_cli=info",
        ))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("ui", sub_m)) => handle_ui(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    log::info!("[homeval::train] Training from config: {:?}", config_path);

    let params = TrainConfig::from_arguments(config_path, matches)?;

    match trainer::run_training(&params) {
        Ok(summary) => {
            log::info!(
                "[homeval::train] Run {} finished. Top features: {}",
                summary.run_id,
                summary.top_features.join(", ")
            );
            println!("{}", serde_json::to_string_pretty(&summary.metrics)?);
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    let params = ServeConfig::from_arguments(config_path, matches)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(&params))
}

fn handle_ui(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    let params = UiConfig::from_arguments(config_path, matches)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_ui(params))
}
