pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "prada")]
#[command(about = "PRADA CLI - serve a database, manage credentials, inspect schemas")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Manage the persisted admin credentials")]
    Init {
        #[command(subcommand)]
        cmd: commands::init::InitCommands,
    },

    #[command(about = "Inspect the schema source")]
    Schema {
        #[command(subcommand)]
        cmd: commands::schema::SchemaCommands,
    },

    #[command(about = "Serve the admin API for a PostgreSQL database")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Check a running server")]
    Status(commands::status::StatusArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Init { cmd } => commands::init::handle(cmd, output_format).await,
        Commands::Schema { cmd } => commands::schema::handle(cmd, output_format).await,
        Commands::Serve(args) => commands::serve::handle(args, output_format).await,
        Commands::Status(args) => commands::status::handle(args, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["prada", "schema", "show", "--json"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
    }

    #[test]
    fn serve_takes_url_and_flags() {
        let cli = Cli::try_parse_from([
            "prada",
            "serve",
            "postgresql://localhost/app",
            "-p",
            "4000",
            "-H",
            "0.0.0.0",
            "--open",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.database_url.as_deref(), Some("postgresql://localhost/app"));
                assert_eq!(args.port, 4000);
                assert_eq!(args.host, "0.0.0.0");
                assert!(args.open);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn init_credentials_requires_login_and_password() {
        assert!(Cli::try_parse_from(["prada", "init", "credentials", "--login", "admin"]).is_err());
        assert!(Cli::try_parse_from(["prada", "init", "credentials", "--login", "admin", "--password", "secret123"]).is_ok());
    }
}
