use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::auth::CredentialStore;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Write the admin credentials file")]
    Credentials {
        #[arg(long, help = "Admin login")]
        login: String,
        #[arg(long, help = "Admin password (at least 6 characters)")]
        password: String,
        #[arg(long, default_value = ".prada", help = "Config directory")]
        dir: PathBuf,
    },

    #[command(about = "Delete the admin credentials file")]
    Reset {
        #[arg(long, default_value = ".prada", help = "Config directory")]
        dir: PathBuf,
    },
}

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Credentials { login, password, dir } => {
            let store = CredentialStore::new(dir);
            let stored = store.save(&login, &password)?;
            output_success(
                output_format,
                &format!("Credentials for '{}' saved to {}", stored.login, store.path().display()),
                Some(json!({ "login": stored.login, "path": store.path() })),
            )
        }
        InitCommands::Reset { dir } => {
            let store = CredentialStore::new(dir);
            let message = if store.delete()? {
                format!("Removed {}", store.path().display())
            } else {
                format!("No credentials at {}", store.path().display())
            };
            output_success(output_format, &message, Some(json!({ "path": store.path() })))
        }
    }
}
