use argon2::password_hash::PasswordHash;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::login::hash_password;
use crate::orders::OrderColumns;
use crate::source::{FileSheetSource, GoogleSheetsSource, SheetSource};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DOCUMENT: &str = "스마트스토어";
pub const DEFAULT_WORKSHEET: &str = "발주발송관리";
/// `axum_extra`'s signing key derivation needs at least this much input.
pub const MIN_SECRET_LEN: usize = 32;

/// Everything the server needs, read once at startup and passed down.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    /// Argon2 PHC string of the shared dashboard password.
    pub password_hash: String,
    /// Raw credential blob for the Google backend. Checked on each fetch.
    pub sheet_credentials: Option<String>,
    pub document: String,
    pub worksheet: String,
    /// When set, orders are read from this local export instead of Google.
    pub orders_file: Option<PathBuf>,
    pub columns: OrderColumns,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let session_secret = get("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_LEN,
                actual: session_secret.len(),
            });
        }

        let password_hash = match (get("DASHBOARD_PASSWORD_HASH"), get("DASHBOARD_PASSWORD")) {
            (Some(hash), _) => {
                PasswordHash::new(&hash)
                    .map_err(|e| ConfigError::InvalidPasswordHash(e.to_string()))?;
                hash
            }
            (None, Some(password)) => {
                hash_password(&password).map_err(ConfigError::Hashing)?
            }
            (None, None) => return Err(ConfigError::Missing("DASHBOARD_PASSWORD")),
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        Ok(AppConfig {
            bind_addr,
            session_secret,
            password_hash,
            sheet_credentials: get("SHEET_CREDENTIALS_JSON")
                .or_else(|| get("GOOGLE_APPLICATION_CREDENTIALS_JSON")),
            document: get("SHEET_DOCUMENT").unwrap_or_else(|| DEFAULT_DOCUMENT.to_string()),
            worksheet: get("SHEET_WORKSHEET").unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
            orders_file: get("ORDERS_FILE").map(PathBuf::from),
            columns: OrderColumns::default(),
        })
    }

    /// The sheet backend this configuration points at.
    pub fn sheet_source(&self) -> Arc<dyn SheetSource> {
        match &self.orders_file {
            Some(path) => Arc::new(FileSheetSource::new(path.clone(), self.worksheet.clone())),
            None => Arc::new(GoogleSheetsSource::new(
                self.sheet_credentials.clone(),
                self.document.clone(),
                self.worksheet.clone(),
            )),
        }
    }
}
