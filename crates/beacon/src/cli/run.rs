use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use beacon_core::config::{BeaconConfig, LoggingConfig};

use crate::runtime::{cancel_on_signal, Beacon, Mode};

/// Run a beacon process group.
#[derive(Parser)]
pub struct RunCommand {
    /// Configuration file path.
    #[arg(short, long, default_value = "beacon.toml")]
    pub config: String,

    /// Read configuration from the Cloud Foundry environment instead of a file.
    #[arg(long)]
    pub cloud_foundry: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RunCommand {
    /// Execute the run command in `mode`.
    pub async fn execute(self, mode: Mode) -> Result<()> {
        let config = self.load_config()?;
        init_tracing(&config.logging, self.verbose);

        println!();
        println!(
            "  {}  {} {} v{}",
            style("📡").bold(),
            style("BEACON").bold().cyan(),
            style(mode).bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "  {} Registry at {}",
            style("🗂").bold(),
            style(&config.registry.url).cyan()
        );
        println!(
            "  {} Listening on {}",
            style("🌐").bold(),
            style(format!("http://{}:{}", config.server.host, config.server.port)).cyan()
        );
        if mode == Mode::Backend && !config.application.cat_ports.is_empty() {
            let ports: Vec<String> = config
                .application
                .cat_ports
                .iter()
                .map(|p| p.to_string())
                .collect();
            println!(
                "  {} Cats on ports {}",
                style("🐈").bold(),
                style(ports.join(",")).cyan()
            );
        }
        println!();

        let shutdown = CancellationToken::new();
        cancel_on_signal(shutdown.clone());

        if let Err(e) = Beacon::new(config).run(mode, shutdown).await {
            tracing::error!(error = %e, "Beacon {} failed", mode);
            return Err(anyhow::anyhow!("{}", e));
        }

        println!("\n  {} Goodbye!", style("👋").bold());

        Ok(())
    }

    /// Load and validate configuration from the selected source.
    fn load_config(&self) -> Result<BeaconConfig> {
        let config = if self.cloud_foundry {
            BeaconConfig::from_cloud_foundry_env()
                .context("Failed to read Cloud Foundry environment")?
        } else {
            let config_path = std::path::Path::new(&self.config);
            if !config_path.exists() {
                anyhow::bail!(
                    "Configuration file not found: {}\nPass --config or --cloud-foundry.",
                    self.config
                );
            }
            BeaconConfig::from_file(config_path)?
        };

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    info!(level = %level, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn command(config: &str) -> RunCommand {
        RunCommand {
            config: config.to_string(),
            cloud_foundry: false,
            verbose: false,
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [application]
            name = "backend"
            cat_ports = [8081, 8082]

            [registry]
            url = "https://registry.example.com"

            [oauth]
            token_url = "https://uaa.example.com/oauth/token"
            client_id = "client"
            client_secret = "secret"
            "#
        )
        .unwrap();

        let config = command(file.path().to_str().unwrap()).load_config().unwrap();

        assert_eq!(config.application.name, "backend");
        assert_eq!(config.application.cat_ports, vec![8081, 8082]);
        assert_eq!(config.registry.poll_interval_secs, 20);
    }

    #[test]
    fn test_missing_config_file() {
        let err = command("/nonexistent/beacon.toml").load_config().unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [application]
            cat_ports = [8081, 8081]

            [registry]
            url = "https://registry.example.com"

            [oauth]
            token_url = "https://uaa.example.com/oauth/token"
            "#
        )
        .unwrap();

        let err = command(file.path().to_str().unwrap()).load_config().unwrap_err();
        assert!(err.to_string().contains("duplicate cat port 8081"));
    }
}
