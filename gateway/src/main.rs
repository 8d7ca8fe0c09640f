mod config;
mod telemetry;

use clap::{Args, Parser};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gateway", about = "Gateway to multiple ArgoCD instances")]
enum CliCommand {
    /// Serve the gateway API and admin probes
    Run(ConfigArgs),
    /// Load and validate a config file, then exit
    ValidateConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    match &cli {
        CliCommand::Run(args) => run(args),
        CliCommand::ValidateConfig(args) => validate_config(args),
    }
}

fn load_config(args: &ConfigArgs) -> Option<Config> {
    match Config::from_file(&args.config_file_path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("{}: {e}", args.config_file_path.display());
            None
        }
    }
}

fn validate_config(args: &ConfigArgs) -> ExitCode {
    let Some(config) = load_config(args) else {
        return ExitCode::FAILURE;
    };

    match config.gateway.validate() {
        Ok(()) => {
            println!(
                "{}: ok, {} instance(s)",
                args.config_file_path.display(),
                config.gateway.argocd.instances.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", args.config_file_path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &ConfigArgs) -> ExitCode {
    let Some(config) = load_config(args) else {
        return ExitCode::FAILURE;
    };

    // Sentry is set up before the runtime starts
    let _guard = match telemetry::init(&config.common) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting gateway");
    match rt.block_on(argo_api::run(config.gateway)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped");
            ExitCode::FAILURE
        }
    }
}
