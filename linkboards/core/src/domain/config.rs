// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Linkboards Configuration
//
// YAML configuration for the board store and services:
// - Store backend selection (memory or sled) and data directory
// - Per-board capacity limits and invite expiry
// - Operation timeout for the access layer
// - Optional role → scope table overrides
// - Event bus capacity

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::aggregate::{
    BoardLimits, DEFAULT_INVITE_EXPIRY_HOURS, DEFAULT_MAX_INVITES, DEFAULT_MAX_MEMBERS,
};
use crate::domain::repository::{SledConfig, StorageBackend};
use crate::domain::role::{BoardRole, RoleScopeTable};

pub const ENV_CONFIG_PATH: &str = "LINKBOARDS_CONFIG_PATH";
pub const ENV_DATA_DIR: &str = "LINKBOARDS_DATA_DIR";
pub const ENV_STORE: &str = "LINKBOARDS_STORE";
pub const ENV_OPERATION_TIMEOUT_MS: &str = "LINKBOARDS_OPERATION_TIMEOUT_MS";

/// Upper bound on `limits.invite_expiry_hours` (ten years).
pub const MAX_INVITE_EXPIRY_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkboardsConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub access: AccessConfig,

    /// Replaces the scopes of the listed roles; unlisted roles keep their defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<HashMap<BoardRole, Vec<String>>>,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Sled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_kind")]
    pub backend: StoreKind,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_kind(),
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_members")]
    pub max_members: usize,

    #[serde(default = "default_max_invites")]
    pub max_invites: usize,

    #[serde(default = "default_invite_expiry_hours")]
    pub invite_expiry_hours: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_members: default_max_members(),
            max_invites: default_max_invites(),
            invite_expiry_hours: default_invite_expiry_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
        }
    }
}

fn default_store_kind() -> StoreKind {
    StoreKind::Sled
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".linkboards").join("data"))
        .unwrap_or_else(|| PathBuf::from("./.linkboards/data"))
}

fn default_max_members() -> usize {
    DEFAULT_MAX_MEMBERS
}

fn default_max_invites() -> usize {
    DEFAULT_MAX_INVITES
}

fn default_invite_expiry_hours() -> i64 {
    DEFAULT_INVITE_EXPIRY_HOURS
}

fn default_operation_timeout_ms() -> u64 {
    5_000
}

fn default_bus_capacity() -> usize {
    1000
}

impl LinkboardsConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. LINKBOARDS_CONFIG_PATH environment variable
    /// 2. ./linkboards.yaml (working directory)
    /// 3. ~/.linkboards/config.yaml (user home)
    /// 4. /etc/linkboards/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./linkboards.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".linkboards").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/linkboards/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Invalid values are
    /// logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            tracing::info!("Environment override: {}={}", ENV_DATA_DIR, dir);
            self.store.data_dir = PathBuf::from(dir);
        }

        if let Some(val) = lookup(ENV_STORE) {
            match val.to_lowercase().as_str() {
                "memory" => self.store.backend = StoreKind::Memory,
                "sled" => self.store.backend = StoreKind::Sled,
                _ => tracing::warn!(
                    "Invalid value for {}: '{}'. Expected memory/sled. Ignoring.",
                    ENV_STORE,
                    val
                ),
            }
        }

        if let Some(val) = lookup(ENV_OPERATION_TIMEOUT_MS) {
            match val.parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: {}={}", ENV_OPERATION_TIMEOUT_MS, ms);
                    self.access.operation_timeout_ms = ms;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for {}: '{}'. Expected milliseconds. Ignoring.",
                    ENV_OPERATION_TIMEOUT_MS,
                    val
                ),
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.limits.max_members == 0 {
            anyhow::bail!("limits.max_members must be at least 1 (the owner)");
        }
        if self.limits.invite_expiry_hours <= 0 {
            anyhow::bail!("limits.invite_expiry_hours must be positive");
        }
        if self.limits.invite_expiry_hours > MAX_INVITE_EXPIRY_HOURS {
            anyhow::bail!(
                "limits.invite_expiry_hours must be at most {} (ten years)",
                MAX_INVITE_EXPIRY_HOURS
            );
        }
        if self.access.operation_timeout_ms == 0 {
            anyhow::bail!("access.operation_timeout_ms must be positive");
        }
        if self.events.bus_capacity == 0 {
            anyhow::bail!("events.bus_capacity must be positive");
        }
        if self.store.backend == StoreKind::Sled && self.store.data_dir.as_os_str().is_empty() {
            anyhow::bail!("store.data_dir cannot be empty for the sled backend");
        }
        if let Some(roles) = &self.roles {
            for (role, scopes) in roles {
                if scopes.iter().any(|s| s.trim().is_empty()) {
                    anyhow::bail!("roles.{}: scope names cannot be empty", role);
                }
            }
        }
        Ok(())
    }

    pub fn board_limits(&self) -> BoardLimits {
        BoardLimits {
            max_members: self.limits.max_members,
            max_invites: self.limits.max_invites,
            invite_expiry: chrono::Duration::hours(
                self.limits.invite_expiry_hours.clamp(1, MAX_INVITE_EXPIRY_HOURS),
            ),
        }
    }

    pub fn role_table(&self) -> RoleScopeTable {
        match &self.roles {
            Some(overrides) => RoleScopeTable::default().with_overrides(overrides),
            None => RoleScopeTable::default(),
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        match self.store.backend {
            StoreKind::Memory => StorageBackend::InMemory,
            StoreKind::Sled => StorageBackend::Sled(SledConfig {
                path: self.store.data_dir.clone(),
            }),
        }
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.access.operation_timeout_ms)
    }
}
