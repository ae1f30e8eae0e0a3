//! YAML configuration files: generation parameters (`--config`) and agent
//! role overrides for edit mode.

use crate::error::{FactoryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Generation parameters supplied via `--config` instead of flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub framework: String,
    pub features: String,
}

impl GenerationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FactoryError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: GenerationConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }
}

// ---------------------------------------------------------------------------
// RolesFile
// ---------------------------------------------------------------------------

/// One agent role as configured on disk: a data-only record consumed by the
/// generic task runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
}

/// Role overrides loaded from a YAML file; roles not listed fall back to the
/// built-in definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesFile {
    #[serde(default)]
    pub agents: Vec<RoleConfig>,
}

impl RolesFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FactoryError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let roles: RolesFile = serde_yaml::from_str(&data)?;
        Ok(roles)
    }

    pub fn find(&self, role: &str) -> Option<&RoleConfig> {
        self.agents.iter().find(|a| a.role == role)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
