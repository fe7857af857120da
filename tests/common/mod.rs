#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use prada_api_rust::app::{build_handler, build_router, AppState};
use prada_api_rust::auth::AuthGate;
use prada_api_rust::config::{AppConfig, ModelConfig, ModelConfigs};
use prada_api_rust::data::InMemoryStore;
use prada_api_rust::hooks::HookRegistry;
use prada_api_rust::schema::load_schema_file;

pub const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/blog.json");
pub const LOGIN: &str = "admin";
pub const PASSWORD: &str = "secret123";

/// Builder for an in-process server over the blog fixture and an in-memory store
pub struct TestApp {
    config: AppConfig,
    config_dir: TempDir,
    hooks: HookRegistry,
    models: ModelConfigs,
}

impl TestApp {
    /// No credentials anywhere; setup is open
    pub fn unconfigured() -> Result<Self> {
        let config_dir = tempfile::tempdir()?;
        let mut config = AppConfig::development();
        config.auth.config_dir = config_dir.path().join(".prada");
        config.security.enable_cors = false;
        Ok(Self {
            config,
            config_dir,
            hooks: HookRegistry::new(),
            models: ModelConfigs::new(),
        })
    }

    /// Plain credentials, as if from PRADA_LOGIN / PRADA_PASSWORD
    pub fn with_credentials() -> Result<Self> {
        let mut app = Self::unconfigured()?;
        app.config.auth.login = Some(LOGIN.to_string());
        app.config.auth.password = Some(PASSWORD.to_string());
        Ok(app)
    }

    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn model(mut self, name: &str, config: ModelConfig) -> Self {
        self.models.insert(name, config);
        self
    }

    pub fn configure(mut self, f: impl FnOnce(&mut AppConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub async fn spawn(self) -> Result<TestServer> {
        let schema = Arc::new(load_schema_file(Some(Path::new(FIXTURE)))?);
        let store = InMemoryStore::new(Arc::clone(&schema));
        let handler = build_handler(&self.config, schema, store.client_registry(), self.models, self.hooks);
        let gate = AuthGate::from_config(&self.config.auth, &self.config.security)?;
        let router = build_router(AppState::new(self.config, handler, gate));

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                eprintln!("test server stopped: {}", e);
            }
        });

        let server = TestServer {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            config_dir: self.config_dir,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }
}

pub struct TestServer {
    pub base_url: String,
    pub store: InMemoryStore,
    config_dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn config_dir(&self) -> std::path::PathBuf {
        self.config_dir.path().join(".prada")
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Log in with the default credentials and return the access token
    pub async fn login(&self, client: &reqwest::Client) -> Result<String> {
        let res = client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "login": LOGIN, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body.pointer("/data/accessToken")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("login response has no access token")
    }
}

/// Client that keeps cookies between requests
pub fn cookie_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().cookie_store(true).build()?)
}

/// Server with plain credentials plus a client that is already logged in
pub async fn authed(app: TestApp) -> Result<(TestServer, Api)> {
    let server = app.spawn().await?;
    let client = reqwest::Client::new();
    let token = server.login(&client).await?;
    let api = Api {
        client,
        base_url: server.base_url.clone(),
        token,
    };
    Ok((server, api))
}

/// Bearer-authenticated JSON calls against the data API
pub struct Api {
    pub client: reqwest::Client,
    pub base_url: String,
    pub token: String,
}

impl Api {
    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::read(res).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::read(res).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .put(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::read(res).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::read(res).await
    }

    /// POST a record and return its `data`
    pub async fn create(&self, model: &str, body: Value) -> Result<Value> {
        let (status, body) = self.post(&format!("/api/{}", model), body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed: {} {}", model, status, body);
        Ok(body["data"].clone())
    }

    async fn read(res: reqwest::Response) -> Result<(StatusCode, Value)> {
        let status = res.status();
        let body = res.json::<Value>().await?;
        Ok((status, body))
    }
}
