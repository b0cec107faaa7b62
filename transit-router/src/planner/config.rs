//! Search configuration for the transit router.

use std::collections::HashMap;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::TransitMode;

use super::cost::CostParams;

/// Which routing strategy a search runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Best arrival time and transfer count only.
    #[default]
    Standard,
    /// Full Pareto search including generalized cost.
    MultiCriteria,
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration parameters for a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub profile: Profile,

    /// Maximum number of transfers; a search runs one more round than this.
    pub max_transfers: usize,

    /// Maximum number of paths to return.
    pub max_results: usize,

    /// How far past the requested time to keep starting iterations (minutes).
    /// Zero searches a single departure time.
    pub search_window_mins: i64,

    /// Distance between iteration start times (seconds).
    pub iteration_step_secs: i32,

    /// Wall-clock limit for one search (milliseconds).
    pub timeout_ms: Option<u64>,

    /// Time needed before getting on a vehicle (seconds).
    pub board_slack_secs: i32,

    /// Time needed after getting off a vehicle (seconds).
    pub alight_slack_secs: i32,

    pub board_slack_by_mode: HashMap<TransitMode, i32>,

    pub alight_slack_by_mode: HashMap<TransitMode, i32>,

    pub cost: CostParams,
}

impl SearchConfig {
    /// Create a configuration with the given core parameters and default
    /// slack and cost settings.
    pub fn new(profile: Profile, max_transfers: usize, max_results: usize, search_window_mins: i64) -> Self {
        Self {
            profile,
            max_transfers,
            max_results,
            search_window_mins,
            ..Self::default()
        }
    }

    /// Reads a configuration from a JSON file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_step_secs <= 0 {
            return Err(ConfigError::Invalid("iteration_step_secs must be positive".into()));
        }
        if self.search_window_mins < 0 {
            return Err(ConfigError::Invalid("search_window_mins must not be negative".into()));
        }
        let slack = [self.board_slack_secs, self.alight_slack_secs]
            .into_iter()
            .chain(self.board_slack_by_mode.values().copied())
            .chain(self.alight_slack_by_mode.values().copied());
        if slack.into_iter().any(|s| s < 0) {
            return Err(ConfigError::Invalid("slack must not be negative".into()));
        }
        if let Some(field) = self.cost.negative_weight() {
            return Err(ConfigError::Invalid(format!("{field} must not be negative")));
        }
        Ok(())
    }

    /// Board slack for a mode, in seconds.
    pub fn board_slack(&self, mode: TransitMode) -> i32 {
        self.board_slack_by_mode
            .get(&mode)
            .copied()
            .unwrap_or(self.board_slack_secs)
    }

    /// Alight slack for a mode, in seconds.
    pub fn alight_slack(&self, mode: TransitMode) -> i32 {
        self.alight_slack_by_mode
            .get(&mode)
            .copied()
            .unwrap_or(self.alight_slack_secs)
    }

    /// Returns the search window as a Duration.
    pub fn search_window(&self) -> Duration {
        Duration::minutes(self.search_window_mins)
    }

    /// Returns the iteration step as a Duration.
    pub fn iteration_step(&self) -> Duration {
        Duration::seconds(i64::from(self.iteration_step_secs))
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_ms.map(std::time::Duration::from_millis)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Standard,
            max_transfers: 5,
            max_results: 10,
            search_window_mins: 60,
            iteration_step_secs: 60,
            timeout_ms: None,
            board_slack_secs: 0,
            alight_slack_secs: 0,
            board_slack_by_mode: HashMap::new(),
            alight_slack_by_mode: HashMap::new(),
            cost: CostParams::default(),
        }
    }
}
