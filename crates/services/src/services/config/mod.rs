//! Process configuration read from the environment.
//!
//! Every value is read once at startup; handlers only ever see the resulting
//! immutable [`AppConfig`].

use std::{env, path::PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;
use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_VERCEL_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
pub const DEFAULT_FIREBASE_API_URL: &str = "https://firebasestorage.googleapis.com";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct VercelBlobConfig {
    pub token: SecretString,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub api_key: SecretString,
    pub project_id: String,
    pub bucket: String,
    pub api_url: String,
}

/// Which upload backends are reachable, in the order they will be tried
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub vercel_blob: Option<VercelBlobConfig>,
    pub firebase: Option<FirebaseConfig>,
    pub uploads_dir: PathBuf,
    /// Local disk is ephemeral on serverless hosts and must not be written
    pub serverless: bool,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base64 encoded HMAC secret for session tokens
    pub session_secret: SecretString,
    pub session_ttl: chrono::Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub cors_origin: Option<String>,
}

/// First non-empty value among `names`
fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let vercel_blob = env_var(&["BLOB_READ_WRITE_TOKEN"]).map(|token| VercelBlobConfig {
            token: SecretString::from(token),
            api_url: env_var(&["VERCEL_BLOB_API_URL"])
                .unwrap_or_else(|| DEFAULT_VERCEL_BLOB_API_URL.to_string()),
        });

        let firebase = match (
            env_var(&["FIREBASE_API_KEY", "NEXT_PUBLIC_FIREBASE_API_KEY"]),
            env_var(&["FIREBASE_PROJECT_ID", "NEXT_PUBLIC_FIREBASE_PROJECT_ID"]),
            env_var(&["FIREBASE_STORAGE_BUCKET", "NEXT_PUBLIC_FIREBASE_STORAGE_BUCKET"]),
        ) {
            (Some(api_key), Some(project_id), Some(bucket)) => Some(FirebaseConfig {
                api_key: SecretString::from(api_key),
                project_id,
                bucket,
                api_url: DEFAULT_FIREBASE_API_URL.to_string(),
            }),
            _ => None,
        };

        Self {
            vercel_blob,
            firebase,
            uploads_dir: utils::assets::uploads_dir(),
            serverless: is_serverless(),
        }
    }
}

/// `VERCEL=1` or the Lambda task root as working directory
pub fn is_serverless() -> bool {
    if env::var("VERCEL").is_ok_and(|v| v == "1") {
        return true;
    }
    env::current_dir().is_ok_and(|cwd| cwd == std::path::Path::new("/var/task"))
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret = match env_var(&["PORTFOLIO_SESSION_SECRET"]) {
            Some(secret) => {
                if STANDARD.decode(&secret).is_err() {
                    return Err(ConfigError::Invalid {
                        name: "PORTFOLIO_SESSION_SECRET",
                        expected: "base64",
                        value: "<redacted>".to_string(),
                    });
                }
                SecretString::from(secret)
            }
            None => {
                tracing::warn!(
                    "PORTFOLIO_SESSION_SECRET not set; generated a per-process secret, sessions will not survive a restart"
                );
                generate_secret()
            }
        };

        let ttl_hours = match env_var(&["PORTFOLIO_SESSION_TTL_HOURS"]) {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or(ConfigError::Invalid {
                    name: "PORTFOLIO_SESSION_TTL_HOURS",
                    expected: "a positive integer",
                    value,
                })?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        Ok(Self {
            session_secret,
            session_ttl: chrono::Duration::hours(ttl_hours),
        })
    }
}

/// 32 random bytes, base64 encoded
pub fn generate_secret() -> SecretString {
    let bytes: [u8; 32] = rand::rng().random();
    SecretString::from(STANDARD.encode(bytes))
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            storage: StorageConfig::from_env(),
            auth: AuthConfig::from_env()?,
            cors_origin: env_var(&["PORTFOLIO_CORS_ORIGIN"]),
        })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const STORAGE_VARS: &[&str] = &[
        "BLOB_READ_WRITE_TOKEN",
        "VERCEL_BLOB_API_URL",
        "FIREBASE_API_KEY",
        "FIREBASE_PROJECT_ID",
        "FIREBASE_STORAGE_BUCKET",
        "NEXT_PUBLIC_FIREBASE_API_KEY",
        "NEXT_PUBLIC_FIREBASE_PROJECT_ID",
        "NEXT_PUBLIC_FIREBASE_STORAGE_BUCKET",
        "VERCEL",
    ];

    fn clear(vars: &[&str]) {
        for var in vars {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn no_cloud_backends_without_env() {
        clear(STORAGE_VARS);
        let config = StorageConfig::from_env();
        assert!(config.vercel_blob.is_none());
        assert!(config.firebase.is_none());
        assert!(!config.serverless);
    }

    #[test]
    #[serial]
    fn firebase_needs_all_three_values_and_accepts_public_names() {
        clear(STORAGE_VARS);
        unsafe {
            env::set_var("NEXT_PUBLIC_FIREBASE_API_KEY", "key");
            env::set_var("FIREBASE_PROJECT_ID", "proj");
        }
        assert!(StorageConfig::from_env().firebase.is_none());

        unsafe { env::set_var("NEXT_PUBLIC_FIREBASE_STORAGE_BUCKET", "bucket.appspot.com") };
        let firebase = StorageConfig::from_env().firebase.unwrap();
        assert_eq!(firebase.project_id, "proj");
        assert_eq!(firebase.bucket, "bucket.appspot.com");
        clear(STORAGE_VARS);
    }

    #[test]
    #[serial]
    fn blank_blob_token_is_unconfigured() {
        clear(STORAGE_VARS);
        unsafe { env::set_var("BLOB_READ_WRITE_TOKEN", "  ") };
        assert!(StorageConfig::from_env().vercel_blob.is_none());

        unsafe { env::set_var("BLOB_READ_WRITE_TOKEN", "tok") };
        let blob = StorageConfig::from_env().vercel_blob.unwrap();
        assert_eq!(blob.api_url, DEFAULT_VERCEL_BLOB_API_URL);
        clear(STORAGE_VARS);
    }

    #[test]
    #[serial]
    fn vercel_flag_marks_serverless() {
        clear(STORAGE_VARS);
        unsafe { env::set_var("VERCEL", "1") };
        assert!(is_serverless());
        clear(STORAGE_VARS);
    }

    #[test]
    #[serial]
    fn session_ttl_must_be_positive() {
        unsafe {
            env::remove_var("PORTFOLIO_SESSION_SECRET");
            env::set_var("PORTFOLIO_SESSION_TTL_HOURS", "0");
        }
        assert!(AuthConfig::from_env().is_err());

        unsafe { env::set_var("PORTFOLIO_SESSION_TTL_HOURS", "2") };
        let auth = AuthConfig::from_env().unwrap();
        assert_eq!(auth.session_ttl, chrono::Duration::hours(2));
        unsafe { env::remove_var("PORTFOLIO_SESSION_TTL_HOURS") };
    }
}
