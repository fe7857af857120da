pub mod credentials;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod service;

pub use credentials::{CredentialStore, StoredCredentials};
pub use error::{AuthError, CredentialsError};
pub use gate::AuthGate;
pub use jwt::{decode_token, is_token_expired, AuthTokens, Claims, TokenSigner};
pub use service::{AuthMode, AuthService, AuthUser};
