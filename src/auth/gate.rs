use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::credentials::CredentialStore;
use super::error::CredentialsError;
use super::service::AuthService;
use crate::config::{AuthConfig, SecurityConfig};

/// Holds the auth service once credentials exist.
///
/// Config- or env-supplied credentials make the gate ready at startup and
/// lock setup out. Otherwise the service appears after the first successful
/// setup and never changes afterwards.
pub struct AuthGate {
    service: RwLock<Option<Arc<AuthService>>>,
    store: CredentialStore,
    config_managed: bool,
    auth: AuthConfig,
    security: SecurityConfig,
}

impl AuthGate {
    pub fn from_config(auth: &AuthConfig, security: &SecurityConfig) -> Result<Self, CredentialsError> {
        let store = CredentialStore::new(&auth.config_dir);

        let (service, config_managed) = match AuthService::from_config(auth, security) {
            Some(service) => (Some(service), true),
            None => match store.load()? {
                Some(stored) => (Some(AuthService::from_stored(&stored, auth, security)), false),
                None => (None, false),
            },
        };

        match &service {
            Some(s) => info!("Authentication ready ({} mode)", s.mode().as_str()),
            None => info!("No credentials configured; waiting for setup"),
        }

        Ok(Self {
            service: RwLock::new(service.map(Arc::new)),
            store,
            config_managed,
            auth: auth.clone(),
            security: security.clone(),
        })
    }

    pub async fn service(&self) -> Option<Arc<AuthService>> {
        self.service.read().await.clone()
    }

    pub async fn is_configured(&self) -> bool {
        self.config_managed || self.service.read().await.is_some() || self.store.is_configured()
    }

    /// True when credentials come from config or env and setup is locked out
    pub fn is_config_managed(&self) -> bool {
        self.config_managed
    }

    /// Persist first-run credentials and install the service
    pub async fn setup(&self, login: &str, password: &str) -> Result<(), CredentialsError> {
        if self.config_managed {
            return Err(CredentialsError::SetupUnavailable);
        }

        let mut guard = self.service.write().await;
        if guard.is_some() || self.store.is_configured() {
            return Err(CredentialsError::AlreadyConfigured);
        }

        let stored = self.store.save(login, password)?;
        *guard = Some(Arc::new(AuthService::from_stored(&stored, &self.auth, &self.security)));
        info!("Setup complete for '{}'", stored.login);
        Ok(())
    }
}
