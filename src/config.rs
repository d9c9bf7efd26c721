//! Configuration management for DocuMind

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::html::HighlightConfig;
use crate::upload::DEFAULT_PROGRESS_STEP;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub lifecycle: LifecycleConfig,
    pub viewer: ViewerConfig,
    pub chat: ChatConfig,
}

/// Timing of the simulated intake pipeline
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Delay between upload progress ticks
    pub tick_interval: Duration,
    /// Progress added per tick (1..=100)
    pub progress_step: u8,
    /// Simulated analysis time after the content is read
    pub analysis_delay: Duration,
    /// Buffered events per subscriber before it starts lagging
    pub event_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub words_per_page: usize,
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub response_delay: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            progress_step: DEFAULT_PROGRESS_STEP,
            analysis_delay: Duration::from_millis(2000),
            event_capacity: 256,
        }
    }
}

impl LifecycleConfig {
    /// Events a successful intake publishes for one document: the intake
    /// record, one per tick, processing, ready and the ready notice
    pub fn events_per_document(&self) -> usize {
        let step = usize::from(self.progress_step.max(1));
        usize::from(crate::upload::PROGRESS_COMPLETE).div_ceil(step) + 4
    }

    /// Copy whose event capacity holds a full batch of `files` documents
    /// without a subscriber lagging
    pub fn sized_for(&self, files: usize) -> Self {
        Self {
            event_capacity: self
                .event_capacity
                .max(self.events_per_document().saturating_mul(files)),
            ..self.clone()
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            words_per_page: crate::document::WORDS_PER_PAGE,
            highlight: HighlightConfig::default(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            response_delay: Duration::from_millis(2000),
        }
    }
}

/// Invalid configuration value
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let progress_step = parse_or(&lookup, "DOCUMIND_PROGRESS_STEP", defaults.lifecycle.progress_step)?;
        if progress_step == 0 || progress_step > 100 {
            return Err(ConfigError::Invalid {
                key: "DOCUMIND_PROGRESS_STEP".to_string(),
                value: progress_step.to_string(),
            });
        }

        Ok(Config {
            lifecycle: LifecycleConfig {
                tick_interval: millis_or(&lookup, "DOCUMIND_TICK_MS", defaults.lifecycle.tick_interval)?,
                progress_step,
                analysis_delay: millis_or(&lookup, "DOCUMIND_ANALYSIS_MS", defaults.lifecycle.analysis_delay)?,
                event_capacity: nonzero_or(&lookup, "DOCUMIND_EVENT_CAPACITY", defaults.lifecycle.event_capacity)?,
            },
            viewer: ViewerConfig {
                words_per_page: nonzero_or(&lookup, "DOCUMIND_WORDS_PER_PAGE", defaults.viewer.words_per_page)?,
                highlight: defaults.viewer.highlight,
            },
            chat: ChatConfig {
                response_delay: millis_or(&lookup, "DOCUMIND_CHAT_DELAY_MS", defaults.chat.response_delay)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
    }
}

fn nonzero_or<F>(lookup: &F, key: &str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default)? {
        0 => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}

fn millis_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default.as_millis() as u64).map(Duration::from_millis)
}
