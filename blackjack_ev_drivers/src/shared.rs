use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use blackjack_ev::{Action, EngineConfig, Rule};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE_NAME: &str = ".blackjack_ev.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config value: {0}")]
    InvalidValue(#[from] serde::de::value::Error),
    #[error("Cannot find home directory")]
    NoHomeDirectory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rule: ConfigRule,
    pub engine: ConfigEngine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRule {
    pub number_of_decks: u8,
    pub allow_das: bool,
    pub hit_split_aces: bool,
}

impl Default for ConfigRule {
    fn default() -> Self {
        let rule = Rule::default();
        ConfigRule {
            number_of_decks: rule.number_of_decks,
            allow_das: rule.allow_das,
            hit_split_aces: rule.hit_split_aces,
        }
    }
}

impl From<ConfigRule> for Rule {
    fn from(config_rule: ConfigRule) -> Self {
        Rule {
            number_of_decks: config_rule.number_of_decks,
            allow_das: config_rule.allow_das,
            hit_split_aces: config_rule.hit_split_aces,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigEngine {
    pub trials: u32,
    pub number_of_threads: usize,
    pub trials_per_chunk: u32,
    pub tie_epsilon: f64,
    /// Action names, e.g. `["Split", "Double", "Hit", "Stand"]`.
    pub tie_break_priority: Vec<String>,
    pub time_budget_ms: Option<u64>,
    pub remove_visible_cards: bool,
    /// Fixed seed for reproducible advice. Seeded from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for ConfigEngine {
    fn default() -> Self {
        let engine = EngineConfig::default();
        ConfigEngine {
            trials: engine.trials,
            number_of_threads: engine.number_of_threads,
            trials_per_chunk: engine.trials_per_chunk,
            tie_epsilon: engine.tie_epsilon,
            tie_break_priority: engine
                .tie_break_priority
                .iter()
                .map(|action| action.to_string())
                .collect(),
            time_budget_ms: None,
            remove_visible_cards: engine.remove_visible_cards,
            seed: None,
        }
    }
}

impl TryInto<EngineConfig> for ConfigEngine {
    type Error = ConfigError;

    fn try_into(self) -> Result<EngineConfig, Self::Error> {
        let tie_break_priority = self
            .tie_break_priority
            .iter()
            .map(|action| action.parse::<Action>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EngineConfig {
            trials: self.trials,
            number_of_threads: self.number_of_threads,
            trials_per_chunk: self.trials_per_chunk,
            tie_epsilon: self.tie_epsilon,
            tie_break_priority,
            time_budget: self.time_budget_ms.map(Duration::from_millis),
            remove_visible_cards: self.remove_visible_cards,
        })
    }
}

/// Reads the content of a given config file and parses it to a Config.
pub fn parse_config_from_file(filename: &str) -> Result<Config, ConfigError> {
    let file_content = fs::read_to_string(filename).map_err(|source| ConfigError::Io {
        path: filename.to_string(),
        source,
    })?;
    parse_config(&file_content)
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home_dir = home::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home_dir.join(DEFAULT_CONFIG_FILE_NAME))
}
