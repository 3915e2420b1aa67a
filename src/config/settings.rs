use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crypto::kdf::{KdfParams, DEFAULT_ITERATIONS, PRODUCTION_MIN_ITERATIONS};
use crate::crypto::MasterSecret;
use crate::errors::{Result, VaultError};
use crate::membership::StaticMembership;

/// Master secret used when none is configured outside production.
///
/// Anyone can read this value: items sealed with it are not protected.
pub const INSECURE_DEV_SECRET: &str = "commvault-insecure-development-secret";

/// Environment variable overriding `environment` from the config file.
pub const ENVIRONMENT_VAR: &str = "COMMVAULT_ENV";

/// Environment name that turns on fail-fast master secret handling.
pub const PRODUCTION: &str = "production";

/// Project-level configuration, loaded from `.commvault.toml`.
///
/// Every field has a sensible default so the vault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path of the SQLite database (relative paths resolve against the project dir).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Deployment environment ("development", "production", ...).
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Name of the environment variable holding the master secret.
    #[serde(default = "default_master_secret_env")]
    pub master_secret_env: String,

    /// PBKDF2 iteration count (default: 210 000).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Community roles: `[members.<community>] <user> = "<role>"`.
    #[serde(default)]
    pub members: BTreeMap<String, BTreeMap<String, String>>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_database_path() -> String {
    ".commvault/vault.db".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_master_secret_env() -> String {
    "COMMVAULT_MASTER_SECRET".to_string()
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            environment: default_environment(),
            master_secret_env: default_master_secret_env(),
            kdf_iterations: default_kdf_iterations(),
            members: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".commvault.toml";

    /// Load settings from `<project_dir>/.commvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the database file.
    pub fn database_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.database_path)
    }

    /// KDF params for sealing new items in the effective environment.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        self.resolve_kdf_params(&self.effective_environment())
    }

    /// Convert the KDF settings into crypto-layer params.
    ///
    /// Production refuses to start below `PRODUCTION_MIN_ITERATIONS`.
    /// Existing items always open with the count recorded at seal time.
    pub fn resolve_kdf_params(&self, environment: &str) -> Result<KdfParams> {
        if environment.eq_ignore_ascii_case(PRODUCTION)
            && self.kdf_iterations < PRODUCTION_MIN_ITERATIONS
        {
            return Err(VaultError::ConfigError(format!(
                "kdf_iterations must be at least {PRODUCTION_MIN_ITERATIONS} in production (got {})",
                self.kdf_iterations
            )));
        }
        Ok(KdfParams {
            iterations: self.kdf_iterations,
        })
    }

    /// Build the membership directory from the `[members]` table.
    pub fn membership(&self) -> StaticMembership {
        StaticMembership::from(self.members.clone())
    }

    /// The environment in effect, honouring `COMMVAULT_ENV`.
    pub fn effective_environment(&self) -> String {
        std::env::var(ENVIRONMENT_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.environment.clone())
    }

    /// Resolve the master secret from the configured environment variable.
    pub fn master_secret(&self) -> Result<MasterSecret> {
        let value = std::env::var(&self.master_secret_env).ok();
        self.resolve_master_secret(value, &self.effective_environment())
    }

    /// Pick the master secret given the raw env value and environment.
    ///
    /// - A non-empty value is always used as-is.
    /// - In production a missing value is a startup error.
    /// - Elsewhere the insecure development secret is used, with a warning.
    pub fn resolve_master_secret(
        &self,
        value: Option<String>,
        environment: &str,
    ) -> Result<MasterSecret> {
        match value.filter(|v| !v.is_empty()) {
            Some(secret) => Ok(MasterSecret::new(secret)),
            None if environment.eq_ignore_ascii_case(PRODUCTION) => {
                Err(VaultError::ConfigError(format!(
                    "{} must be set in production; refusing to start",
                    self.master_secret_env
                )))
            }
            None => {
                warn!(
                    env_var = %self.master_secret_env,
                    environment,
                    "master secret not configured; using the INSECURE development default"
                );
                Ok(MasterSecret::new(INSECURE_DEV_SECRET))
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
