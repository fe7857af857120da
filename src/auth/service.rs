use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::credentials::StoredCredentials;
use super::error::AuthError;
use super::jwt::{AuthTokens, Claims, TokenSigner};
use super::password::{constant_time_eq, generate_secret, verify_password};
use crate::config::{AuthConfig, SecurityConfig};

/// The authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Any credentials are accepted
    Disabled,
    /// Exact comparison against configured values
    Plain { login: String, password: String },
    /// Hash comparison against the persisted file
    Hashed {
        login: String,
        password_hash: String,
        salt: String,
    },
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Disabled => "disabled",
            AuthMode::Plain { .. } => "plain",
            AuthMode::Hashed { .. } => "hashed",
        }
    }
}

pub struct AuthService {
    mode: AuthMode,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(mode: AuthMode, secret: &str, security: &SecurityConfig) -> Self {
        let signer = TokenSigner::new(
            secret,
            Duration::seconds(security.access_token_ttl_secs),
            Duration::seconds(security.refresh_token_ttl_secs),
        );
        Self { mode, signer }
    }

    /// Service for disabled or plain-credential configs; `None` when neither applies
    pub fn from_config(auth: &AuthConfig, security: &SecurityConfig) -> Option<Self> {
        let mode = if auth.disabled {
            AuthMode::Disabled
        } else if auth.has_plain_credentials() {
            AuthMode::Plain {
                login: auth.login.clone().unwrap_or_default(),
                password: auth.password.clone().unwrap_or_default(),
            }
        } else {
            return None;
        };

        let secret = auth.jwt_secret.clone().unwrap_or_else(generate_secret);
        Some(Self::new(mode, &secret, security))
    }

    /// Service over persisted credentials. A configured secret beats the stored one.
    pub fn from_stored(stored: &StoredCredentials, auth: &AuthConfig, security: &SecurityConfig) -> Self {
        let secret = auth.jwt_secret.clone().unwrap_or_else(|| stored.secret.clone());
        let mode = AuthMode::Hashed {
            login: stored.login.clone(),
            password_hash: stored.password_hash.clone(),
            salt: stored.salt.clone(),
        };
        Self::new(mode, &secret, security)
    }

    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// A mismatch is `None`, never an error
    pub fn validate_credentials(&self, login: &str, password: &str) -> Option<AuthUser> {
        let valid = match &self.mode {
            AuthMode::Disabled => return Some(AuthUser::admin("admin")),
            AuthMode::Plain {
                login: expected_login,
                password: expected_password,
            } => {
                constant_time_eq(login.as_bytes(), expected_login.as_bytes())
                    & constant_time_eq(password.as_bytes(), expected_password.as_bytes())
            }
            AuthMode::Hashed {
                login: expected_login,
                password_hash,
                salt,
            } => login == expected_login && verify_password(password, password_hash, salt),
        };

        valid.then(|| AuthUser::admin(login))
    }

    pub fn generate_tokens(&self, user: &AuthUser) -> Result<AuthTokens, AuthError> {
        Ok(AuthTokens {
            access_token: self.signer.access_token(user)?,
            refresh_token: self.signer.refresh_token(user)?,
        })
    }

    pub fn generate_access_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        self.signer.access_token(user)
    }

    /// Signature and expiry only; the token type is not inspected
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        self.signer.verify(token)
    }

    /// Rejects refresh tokens
    pub fn verify_access_token(&self, token: &str) -> Option<Claims> {
        self.verify_token(token).filter(|c| !c.is_refresh())
    }

    /// Accepts only refresh tokens
    pub fn verify_refresh_token(&self, token: &str) -> Option<Claims> {
        self.verify_token(token).filter(Claims::is_refresh)
    }
}
