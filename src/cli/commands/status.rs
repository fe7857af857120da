use clap::Args;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct StatusArgs {
    #[arg(long, env = "PRADA_URL", default_value = "http://localhost:3000", help = "Server base URL")]
    pub url: String,
}

pub async fn handle(args: StatusArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = url::Url::parse(&args.url)?;
    let client = reqwest::Client::new();

    let health = match fetch(&client, base.join("health")?).await {
        Ok(body) => body,
        Err(e) => {
            output_error(output_format, &format!("{} is not reachable: {}", base, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server not reachable");
        }
    };
    let setup = fetch(&client, base.join("api/setup/status")?).await?;

    let configured = setup
        .pointer("/data/configured")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let version = health
        .pointer("/data/version")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let message = if configured {
        format!("{} is up (v{}), credentials configured", base, version)
    } else {
        format!("{} is up (v{}), waiting for setup", base, version)
    };
    output_success(
        output_format,
        &message,
        Some(json!({ "url": base.as_str(), "version": version, "configured": configured })),
    )
}

async fn fetch(client: &reqwest::Client, url: url::Url) -> anyhow::Result<Value> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json().await?)
}
