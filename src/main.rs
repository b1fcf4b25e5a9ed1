//! git-lfs-authenticate entry point

mod cli;

use crate::cli::{Cli, Environment};
use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use clap::Parser;
use git_lfs_authenticate::{AuthenticateError, AuthorityProbe, Config, Invocation, RequestHandler};
use std::io::Write;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: git-lfs-authenticate <repo> <operation> [oid]";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the response.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            debug!(error = %e, "invalid arguments");
            eprintln!("{}", AuthenticateError::Usage(USAGE.to_string()));
            return ExitCode::FAILURE;
        }
    };

    match run(cli, Environment::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Messages already embed their cause; print only the top-level one.
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, env: Environment) -> Result<()> {
    let config_path = match env.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let probe = AuthorityProbe::from_env();
    let handler = RequestHandler::new(config_path, probe);

    let invocation = Invocation {
        repo: cli.repo,
        operation: cli.operation,
        oid: cli.oid,
        user: env.user,
    };

    let envelope = handler.handle(&invocation).await?;
    let line = envelope.to_json_line().map_err(AuthenticateError::from)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(line.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| anyhow!("failed to write response: {}", e))?;

    Ok(())
}
