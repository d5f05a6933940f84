//! Configuration management for Gavel
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GAVEL_*)
//! 3. Config file (~/.config/gavel/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ReviewType;
use crate::{Error, Result};

/// Recognized reviewer persona keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersonaKey {
    /// General-purpose reviewer; the default when none is requested
    #[default]
    Full,
    Security,
    Performance,
    Architecture,
}

impl PersonaKey {
    /// All recognized persona keys
    pub fn all() -> &'static [PersonaKey] {
        &[
            PersonaKey::Full,
            PersonaKey::Security,
            PersonaKey::Performance,
            PersonaKey::Architecture,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaKey::Full => "full",
            PersonaKey::Security => "security",
            PersonaKey::Performance => "performance",
            PersonaKey::Architecture => "architecture",
        }
    }

    /// Persona implied by a review type when none was requested explicitly
    pub fn for_review_type(review_type: ReviewType) -> Self {
        match review_type {
            ReviewType::Full | ReviewType::Incremental => PersonaKey::Full,
            ReviewType::Security => PersonaKey::Security,
            ReviewType::Performance => PersonaKey::Performance,
        }
    }

    /// Resolve the persona for a review: first recognized requested key,
    /// falling back to the review type's implied persona
    pub fn select(requested: &[String], review_type: ReviewType) -> Self {
        requested
            .iter()
            .find_map(|key| key.parse().ok())
            .unwrap_or_else(|| Self::for_review_type(review_type))
    }

    /// The review type this persona naturally performs
    ///
    /// Architecture reviews run as full reviews; there is no dedicated
    /// review type for them.
    pub fn review_type(&self) -> ReviewType {
        match self {
            PersonaKey::Full | PersonaKey::Architecture => ReviewType::Full,
            PersonaKey::Security => ReviewType::Security,
            PersonaKey::Performance => ReviewType::Performance,
        }
    }
}

impl std::fmt::Display for PersonaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PersonaKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(PersonaKey::Full),
            "security" | "sec" => Ok(PersonaKey::Security),
            "performance" | "perf" => Ok(PersonaKey::Performance),
            "architecture" | "arch" => Ok(PersonaKey::Architecture),
            _ => Err(format!("Unknown persona: {}", s)),
        }
    }
}

/// Static configuration for one reviewer persona
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Human-readable name used in prompts and activity descriptions
    pub display_name: String,

    /// Focus areas injected into the reviewer prompt
    pub focus_areas: Vec<String>,

    /// Wall-clock budget for one review iteration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Model override for this persona (None uses the agent default)
    pub model: Option<String>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            display_name: "Full Review".to_string(),
            focus_areas: vec![
                "Correctness of the change".to_string(),
                "Code quality and readability".to_string(),
                "Test coverage".to_string(),
            ],
            timeout: Duration::from_secs(15 * 60),
            model: None,
        }
    }
}

impl PersonaConfig {
    fn default_for(key: PersonaKey) -> Self {
        match key {
            PersonaKey::Full => Self::default(),
            PersonaKey::Security => Self {
                display_name: "Security Review".to_string(),
                focus_areas: vec![
                    "Input validation and injection".to_string(),
                    "Authentication and authorization".to_string(),
                    "Secrets handling".to_string(),
                ],
                ..Self::default()
            },
            PersonaKey::Performance => Self {
                display_name: "Performance Review".to_string(),
                focus_areas: vec![
                    "Algorithmic complexity".to_string(),
                    "Allocation and copying".to_string(),
                    "Blocking calls on hot paths".to_string(),
                ],
                ..Self::default()
            },
            PersonaKey::Architecture => Self {
                display_name: "Architecture Review".to_string(),
                focus_areas: vec![
                    "Module boundaries and coupling".to_string(),
                    "API surface and compatibility".to_string(),
                    "Error handling strategy".to_string(),
                ],
                ..Self::default()
            },
        }
    }
}

/// The full persona table, read-only after process init
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersonaTable {
    pub full: PersonaConfig,
    pub security: PersonaConfig,
    pub performance: PersonaConfig,
    pub architecture: PersonaConfig,
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self {
            full: PersonaConfig::default_for(PersonaKey::Full),
            security: PersonaConfig::default_for(PersonaKey::Security),
            performance: PersonaConfig::default_for(PersonaKey::Performance),
            architecture: PersonaConfig::default_for(PersonaKey::Architecture),
        }
    }
}

impl PersonaTable {
    /// Look up the configuration for a persona key
    pub fn get(&self, key: PersonaKey) -> &PersonaConfig {
        match key {
            PersonaKey::Full => &self.full,
            PersonaKey::Security => &self.security,
            PersonaKey::Performance => &self.performance,
            PersonaKey::Architecture => &self.architecture,
        }
    }
}

/// Configuration for the external reviewer agent command
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Path to the reviewer agent executable
    pub executable: String,

    /// Arguments passed before the prompt
    pub args: Vec<String>,

    /// Global default model
    pub model: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            executable: "claude".to_string(),
            args: vec!["--print".to_string()],
            model: None,
        }
    }
}

/// Engine-level settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Override for the review store location
    pub database_path: Option<PathBuf>,

    /// How long shutdown waits for in-flight workers
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Reviewer agent command configuration
    pub agent: AgentConfig,

    /// Engine-level settings
    pub engine: EngineSettings,

    /// Reviewer persona table
    pub personas: PersonaTable,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if the file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gavel/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gavel").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GAVEL_AGENT_PATH: Path to the reviewer agent executable
    /// - GAVEL_MODEL: Model to use
    /// - GAVEL_DB_PATH: Review store location
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(agent_path) = std::env::var("GAVEL_AGENT_PATH") {
            self.agent.executable = agent_path;
        }

        if let Ok(model) = std::env::var("GAVEL_MODEL") {
            self.agent.model = Some(model);
        }

        if let Ok(db_path) = std::env::var("GAVEL_DB_PATH") {
            self.engine.database_path = Some(PathBuf::from(db_path));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        agent_path: Option<String>,
        db_path: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = agent_path {
            self.agent.executable = path;
        }

        if let Some(path) = db_path {
            self.engine.database_path = Some(path);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        agent_path: Option<String>,
        db_path: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(agent_path, db_path))
    }
}
