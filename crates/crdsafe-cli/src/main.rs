//! crdsafe - check whether a CRD update is a safe upgrade

use std::path::PathBuf;

use clap::Parser;
use console::style;
use miette::Diagnostic;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod check;
mod display;
mod error;
mod exit_codes;

use display::OutputFormat;
use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "crdsafe")]
#[command(version, about = "Check whether a CustomResourceDefinition update is a safe upgrade")]
#[command(
    long_about = "Compares the installed CRD against its replacement and fails if the new \
    revision could break stored or existing custom resources: scope changes, removed \
    stored versions or fields, and tightened validation on served versions."
)]
struct Cli {
    /// Path to the currently installed CRD manifest
    #[arg(
        long = "oldCRD",
        visible_alias = "old-crd",
        value_name = "PATH",
        required_unless_present = "from_cluster"
    )]
    old_crd: Option<PathBuf>,

    /// Path to the CRD manifest that would replace it
    #[arg(long = "newCRD", visible_alias = "new-crd", value_name = "PATH")]
    new_crd: PathBuf,

    /// Kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Read the old CRD from the cluster instead of --oldCRD
    #[arg(long, conflicts_with = "old_crd")]
    from_cluster: bool,

    /// Abort the check after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too
            let code = if err.use_stderr() {
                exit_codes::ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.debug);

    if let Err(err) = check::run(&cli).await {
        report_error(&err);
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn report_error(err: &CliError) {
    eprintln!("{} {}", style("✗").red().bold(), err);
    if let Some(help) = err.help() {
        eprintln!("  {} {}", style("hint:").blue(), help);
    }
    if let CliError::Incompatible(upgrade) = err {
        display::print_summary(upgrade);
    }
}
