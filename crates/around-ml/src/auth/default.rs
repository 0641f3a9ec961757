//! Application default credentials.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;

use super::{
    AccessToken, AuthorizedUserProvider, CredentialsFile, MetadataServerProvider,
    ServiceAccountProvider, TRACING_TARGET, TokenProvider,
};
use crate::error::Result;

/// Environment variable naming an explicit credentials file.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// File name gcloud writes application default credentials to.
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Where [`DefaultCredentials`] found its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// File named by `GOOGLE_APPLICATION_CREDENTIALS`.
    EnvironmentFile(PathBuf),
    /// gcloud's well-known credentials file.
    WellKnownFile(PathBuf),
    /// Instance metadata server.
    MetadataServer,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvironmentFile(path) => write!(f, "{CREDENTIALS_ENV} ({})", path.display()),
            Self::WellKnownFile(path) => write!(f, "gcloud credentials ({})", path.display()),
            Self::MetadataServer => f.write_str("metadata server"),
        }
    }
}

impl CredentialSource {
    /// Resolves the credential source from environment lookups.
    ///
    /// Order: `GOOGLE_APPLICATION_CREDENTIALS`, then gcloud's well-known file
    /// if it exists, then the metadata server.
    async fn resolve(env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = env(CREDENTIALS_ENV).filter(|path| !path.is_empty()) {
            return Self::EnvironmentFile(PathBuf::from(path));
        }

        if let Some(path) = well_known_file(&env)
            && tokio::fs::metadata(&path)
                .await
                .is_ok_and(|metadata| metadata.is_file())
        {
            return Self::WellKnownFile(path);
        }

        Self::MetadataServer
    }
}

fn well_known_file(env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let config_dir = match env("CLOUDSDK_CONFIG").filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None if cfg!(windows) => PathBuf::from(env("APPDATA")?).join("gcloud"),
        None => PathBuf::from(env("HOME")?).join(".config").join("gcloud"),
    };

    Some(config_dir.join(WELL_KNOWN_FILE))
}

/// Token provider picked from the process environment.
#[derive(Clone)]
pub struct DefaultCredentials {
    source: CredentialSource,
    provider: Arc<dyn TokenProvider>,
}

impl fmt::Debug for DefaultCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCredentials")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl DefaultCredentials {
    /// Discovers credentials from the process environment.
    pub async fn discover() -> Result<Self> {
        Self::discover_with(Client::new()).await
    }

    /// Discovers credentials, sending token requests through `http`.
    pub async fn discover_with(http: Client) -> Result<Self> {
        let source = CredentialSource::resolve(|name| std::env::var(name).ok()).await;
        Self::from_source(source, http).await
    }

    /// Builds the provider for an already resolved source.
    pub async fn from_source(source: CredentialSource, http: Client) -> Result<Self> {
        let provider: Arc<dyn TokenProvider> = match &source {
            CredentialSource::EnvironmentFile(path) | CredentialSource::WellKnownFile(path) => {
                match CredentialsFile::from_path(path).await? {
                    CredentialsFile::AuthorizedUser(key) => {
                        Arc::new(AuthorizedUserProvider::with_http_client(key, http))
                    }
                    CredentialsFile::ServiceAccount(key) => {
                        Arc::new(ServiceAccountProvider::with_http_client(key, http)?)
                    }
                }
            }
            CredentialSource::MetadataServer => {
                Arc::new(MetadataServerProvider::from_env()?.with_http_client(http))
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            source = %source,
            "Using application default credentials"
        );

        Ok(Self { source, provider })
    }

    /// Returns where the credentials were found.
    pub fn source(&self) -> &CredentialSource {
        &self.source
    }
}

#[async_trait::async_trait]
impl TokenProvider for DefaultCredentials {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        self.provider.access_token(scope).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[tokio::test]
    async fn test_env_file_takes_precedence() {
        let source = CredentialSource::resolve(lookup(&[
            (CREDENTIALS_ENV, "/etc/ml/key.json"),
            ("HOME", "/home/ml"),
        ]))
        .await;
        assert_eq!(
            source,
            CredentialSource::EnvironmentFile(PathBuf::from("/etc/ml/key.json"))
        );
    }

    #[tokio::test]
    async fn test_well_known_file_from_cloudsdk_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WELL_KNOWN_FILE);
        std::fs::write(&path, "{}").unwrap();

        let source =
            CredentialSource::resolve(lookup(&[("CLOUDSDK_CONFIG", dir.path().to_str().unwrap())]))
                .await;
        assert_eq!(source, CredentialSource::WellKnownFile(path));
    }

    #[tokio::test]
    async fn test_falls_back_to_metadata_server() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            CredentialSource::resolve(lookup(&[("CLOUDSDK_CONFIG", dir.path().to_str().unwrap())]))
                .await;
        assert_eq!(source, CredentialSource::MetadataServer);

        let source = CredentialSource::resolve(lookup(&[])).await;
        assert_eq!(source, CredentialSource::MetadataServer);
    }

    #[tokio::test]
    async fn test_from_source_rejects_unknown_file_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        std::fs::write(&path, r#"{"type":"external_account"}"#).unwrap();

        let error =
            DefaultCredentials::from_source(CredentialSource::EnvironmentFile(path), Client::new())
                .await
                .unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::AuthError);
    }

    #[tokio::test]
    async fn test_from_source_authorized_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        std::fs::write(
            &path,
            r#"{"type":"authorized_user","client_id":"id","client_secret":"s","refresh_token":"r"}"#,
        )
        .unwrap();

        let credentials = DefaultCredentials::from_source(
            CredentialSource::WellKnownFile(path.clone()),
            Client::new(),
        )
        .await
        .unwrap();
        assert_eq!(credentials.source(), &CredentialSource::WellKnownFile(path));
    }
}
