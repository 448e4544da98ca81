use clap::{Parser, Subcommand};
use watchtower_detection::service::ServiceConfig;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the slashing detection node
    #[command(name = "node")]
    Node(NodeCommand),
}

#[derive(Debug, Parser)]
pub struct NodeCommand {
    /// Skip detection over historical chain data at startup
    #[arg(long, default_value_t = false)]
    pub disable_historical_detection: bool,

    /// Verbosity level
    #[arg(short, long, default_value_t = 3)]
    pub verbosity: u8,
}

impl NodeCommand {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            disable_historical_detection: self.disable_historical_detection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_node_command() {
        let cli = Cli::parse_from(["program", "node", "--disable-historical-detection"]);

        match cli.command {
            Commands::Node(cmd) => {
                assert!(cmd.disable_historical_detection);
                assert!(cmd.service_config().disable_historical_detection);
                assert_eq!(cmd.verbosity, 3);
            }
        }
    }
}
