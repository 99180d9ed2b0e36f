use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use pb_auth::{AccountKind, ClientConfig, HttpTimeouts};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{AuthSection, HttpSection};

pub const PROFILE_FILE: &str = "profile.toml";

/// Connection profile stored as TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub base_url: String,
    pub auth: Option<AuthSection>,
    pub http: Option<HttpSection>,
}

impl Profile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            http: None,
        }
    }

    pub async fn load(path: &Path) -> Result<Self, ProfileError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProfileError::ProfileFileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(ProfileError::ProfileFileReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        debug!(path = %path.display(), "Loaded profile");
        toml::from_str(&content).map_err(|e| ProfileError::ProfileParsingFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), ProfileError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ProfileError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ProfileError::ProfileSerializationFailed { source: e })?;

        tokio::fs::write(path, toml)
            .await
            .map_err(|e| ProfileError::ProfileFileWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// `profile.toml` in the per-user config directory
    pub fn default_path() -> Result<PathBuf, ProfileError> {
        let proj_dirs = ProjectDirs::from("com", "pocketbase", "pb-client")
            .ok_or(ProfileError::ProjectDirectoriesUnavailable)?;
        Ok(proj_dirs.config_dir().join(PROFILE_FILE))
    }

    pub fn into_client_config(self) -> Result<ClientConfig, ProfileError> {
        let mut config =
            ClientConfig::parse(&self.base_url).map_err(|e| ProfileError::InvalidBaseUrl {
                url: self.base_url.clone(),
                source: e,
            })?;

        config = match self.auth {
            None => config,
            Some(AuthSection::Password {
                account,
                email,
                password,
            }) => config.with_email_password(AccountKind::from(account), email, password),
            Some(AuthSection::Token { account, token }) => {
                config.with_token(AccountKind::from(account), token)
            }
        };

        if let Some(http) = self.http {
            let defaults = HttpTimeouts::default();
            config = config.with_http_timeouts(HttpTimeouts {
                connect: http
                    .connect_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.connect),
                request: http
                    .request_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.request),
            });

            if let Some(user_agent) = http.user_agent {
                config = config.with_user_agent(user_agent);
            }
            if let Some(minutes) = http.token_validity_minutes {
                let validity = Duration::from_secs(minutes.saturating_mul(60));
                config = config.with_token_validity(validity);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_auth::Credentials;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_profile_file_not_found() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(PROFILE_FILE);

        let result = Profile::load(&path).await;

        if let Err(ProfileError::ProfileFileNotFound { path: missing }) = result {
            assert_eq!(missing, path);
        } else {
            panic!("Expected ProfileFileNotFound error");
        }
    }

    #[tokio::test]
    async fn test_load_profile_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(PROFILE_FILE);
        fs::write(&path, "invalid toml content {{{").unwrap();

        let result = Profile::load(&path).await;

        assert!(matches!(result, Err(ProfileError::ProfileParsingFailed { .. })));
    }

    #[tokio::test]
    async fn test_save_and_load_profile() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join(PROFILE_FILE);

        let profile = Profile {
            base_url: "http://localhost:8090".to_string(),
            auth: Some(AuthSection::Token {
                account: "admin".to_string(),
                token: "tok".to_string(),
            }),
            http: Some(HttpSection {
                request_timeout_secs: Some(5),
                ..HttpSection::default()
            }),
        };

        profile.save(&path).await.unwrap();
        let loaded = Profile::load(&path).await.unwrap();

        assert_eq!(loaded, profile);
    }

    #[tokio::test]
    async fn test_password_profile_into_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(PROFILE_FILE);
        fs::write(
            &path,
            r#"
base_url = "http://localhost:8090"

[auth]
method = "password"
email = "user@user.com"
password = "user@user.com"

[http]
connect_timeout_secs = 3
token_validity_minutes = 15
"#,
        )
        .unwrap();

        let config = Profile::load(&path).await.unwrap().into_client_config().unwrap();

        match &config.credentials {
            Credentials::EmailPassword { account, email, .. } => {
                assert_eq!(account, &AccountKind::users());
                assert_eq!(email, "user@user.com");
            }
            other => panic!("Expected EmailPassword credentials, got {other:?}"),
        }
        assert_eq!(config.http_timeouts.connect, Duration::from_secs(3));
        assert_eq!(config.http_timeouts.request, HttpTimeouts::default().request);
        assert_eq!(config.token_validity, Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_admin_account_and_anonymous_profile() {
        let profile = Profile {
            auth: Some(AuthSection::Password {
                account: "admin".to_string(),
                email: "admin@admin.com".to_string(),
                password: "secret".to_string(),
            }),
            ..Profile::new("http://localhost:8090")
        };
        assert!(!format!("{profile:?}").contains("secret"));

        let config = profile.into_client_config().unwrap();
        assert!(matches!(
            config.credentials,
            Credentials::EmailPassword { account: AccountKind::Admin, .. }
        ));

        let config = Profile::new("http://localhost:8090").into_client_config().unwrap();
        assert!(matches!(config.credentials, Credentials::None));
    }

    #[test]
    fn test_huge_token_validity_saturates() {
        let profile = Profile {
            http: Some(HttpSection {
                token_validity_minutes: Some(u64::MAX),
                ..HttpSection::default()
            }),
            ..Profile::new("http://localhost:8090")
        };

        let config = profile.into_client_config().unwrap();
        assert_eq!(config.token_validity, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Profile::new("not a url").into_client_config();
        assert!(matches!(result, Err(ProfileError::InvalidBaseUrl { .. })));
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(
        "Project directories are unavailable - this usually indicates an unsupported OS or missing home directory"
    )]
    ProjectDirectoriesUnavailable,

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Profile file not found: '{path}'")]
    ProfileFileNotFound { path: PathBuf },

    #[error("Failed to read profile file '{path}': {source}")]
    ProfileFileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write profile file '{path}': {source}")]
    ProfileFileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse profile file '{path}': {source}")]
    ProfileParsingFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize profile: {source}")]
    ProfileSerializationFailed {
        #[source]
        source: toml::ser::Error,
    },

    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: pb_auth::ClientError,
    },
}
