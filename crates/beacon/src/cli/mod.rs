mod run;

pub use run::RunCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::runtime::Mode;

/// Beacon - self-registering demo services
#[derive(Parser)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the info server, the cat servers and the registration poller.
    Backend(RunCommand),

    /// Run the frontend proxy server.
    Frontend(RunCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Backend(cmd) => cmd.execute(Mode::Backend).await,
            Commands::Frontend(cmd) => cmd.execute(Mode::Frontend).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_backend() {
        let cli = Cli::try_parse_from(["beacon", "backend", "--config", "custom.toml"]).unwrap();
        match cli.command {
            Commands::Backend(cmd) => assert_eq!(cmd.config, "custom.toml"),
            Commands::Frontend(_) => panic!("expected backend"),
        }
    }

    #[test]
    fn test_cli_parse_frontend_flags() {
        let cli = Cli::try_parse_from(["beacon", "frontend", "--cloud-foundry", "-v"]).unwrap();
        match cli.command {
            Commands::Frontend(cmd) => {
                assert!(cmd.cloud_foundry);
                assert!(cmd.verbose);
                assert_eq!(cmd.config, "beacon.toml");
            }
            Commands::Backend(_) => panic!("expected frontend"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["beacon"]).is_err());
    }
}
