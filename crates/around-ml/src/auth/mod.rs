//! Bearer token acquisition.
//!
//! The prediction client only depends on [`TokenProvider`]. The providers in
//! this module cover the usual ways of obtaining a Google OAuth2 access token:
//!
//! - [`StaticTokenProvider`]: a pre-minted token.
//! - [`AuthorizedUserProvider`]: a gcloud user credentials file.
//! - [`ServiceAccountProvider`]: a service account key file.
//! - [`MetadataServerProvider`]: the metadata server of a cloud instance.
//! - [`DefaultCredentials`]: picks one of the above from the environment.
//!
//! Tokens are acquired fresh for every call; nothing is cached.

mod authorized_user;
mod credentials_file;
mod default;
mod metadata;
mod service_account;
mod static_token;
mod token;

use std::sync::Arc;

pub use authorized_user::AuthorizedUserProvider;
pub use credentials_file::{AuthorizedUserKey, CredentialsFile, ServiceAccountKey};
pub use default::{CredentialSource, DefaultCredentials};
pub use metadata::MetadataServerProvider;
pub use service_account::ServiceAccountProvider;
pub use static_token::StaticTokenProvider;
pub use token::AccessToken;

use crate::error::Result;

/// Tracing target for credential operations.
pub const TRACING_TARGET: &str = "around_ml::auth";

/// OAuth2 scope granting access to Google Cloud APIs.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Google OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Source of bearer tokens for the prediction endpoint.
///
/// Implementations report failures as [`Error::Auth`](crate::Error::Auth).
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Acquires an access token valid for `scope`.
    async fn access_token(&self, scope: &str) -> Result<AccessToken>;
}

#[async_trait::async_trait]
impl<T> TokenProvider for Arc<T>
where
    T: TokenProvider + ?Sized,
{
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        (**self).access_token(scope).await
    }
}

#[async_trait::async_trait]
impl<T> TokenProvider for Box<T>
where
    T: TokenProvider + ?Sized,
{
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        (**self).access_token(scope).await
    }
}
