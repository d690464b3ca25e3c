//! The `profiles-api` command.
//!
//! ```text
//! profiles-api [--config profiles.toml] runserver [ADDR]
//! profiles-api [--config profiles.toml] show-urls
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use profiles_api::{application, urls, ProfileStore};
use profiles_core::logging::setup_logging;
use profiles_core::{settings_loader, Settings};

#[derive(Debug, Parser)]
#[command(name = "profiles-api", version, about = "Profiles REST API server")]
struct Cli {
    /// Settings file (TOML, or JSON by extension). `PROFILES_*` environment
    /// variables override it.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the API (the default).
    Runserver {
        /// Address to bind, overriding `bind_address`.
        addr: Option<String>,
    },
    /// Print the route table in resolution order.
    ShowUrls,
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => settings_loader::from_file_with_env(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => settings_loader::from_env(),
    };
    settings.validate()?;
    Ok(settings)
}

async fn run(command: Command, settings: Settings) -> anyhow::Result<()> {
    let store = Arc::new(ProfileStore::new());

    match command {
        Command::Runserver { addr } => {
            let addr = addr.unwrap_or_else(|| settings.bind_address.clone());
            let app = application(&settings, &store).context("building the route table")?;
            app.run(&addr).await?;
        }
        Command::ShowUrls => {
            let resolver = urls::build_urls(&store, &settings).context("building the route table")?;
            for (route, name, _) in resolver.collect_routes() {
                println!("/{route:<40} {}", name.unwrap_or_default());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&settings);

    let command = cli.command.unwrap_or(Command::Runserver { addr: None });
    if let Err(err) = run(command, settings).await {
        tracing::error!(error = %format!("{err:#}"), "fatal error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_runserver_with_addr() {
        let cli = Cli::parse_from(["profiles-api", "--config", "p.toml", "runserver", "0.0.0.0:9000"]);
        assert_eq!(cli.config.as_deref(), Some(Path::new("p.toml")));
        assert!(matches!(
            cli.command,
            Some(Command::Runserver { addr: Some(ref a) }) if a == "0.0.0.0:9000"
        ));
    }

    #[test]
    fn test_parse_show_urls() {
        let cli = Cli::parse_from(["profiles-api", "show-urls"]);
        assert!(matches!(cli.command, Some(Command::ShowUrls)));
    }

    #[test]
    fn test_missing_config_file_fails() {
        assert!(load_settings(Some(Path::new("/nonexistent/profiles.toml"))).is_err());
    }
}
