//! Fatal errors: anything that stops a health check run before a report exists.
//!
//! Per-instrument problems never surface here; they are `LoadError`s that
//! the store logs and skips (see `data::ingest`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    /// Invalid or conflicting construction arguments.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No instrument universe could be resolved from any market in the chain.
    #[error("no instrument universe could be resolved (tried: {})", tried.join(", "))]
    DataUnavailable { tried: Vec<String> },

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HealthError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        HealthError::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_unavailable_lists_every_market_tried() {
        let err = HealthError::DataUnavailable {
            tried: vec!["all".into(), "twii".into()],
        };
        assert_eq!(
            err.to_string(),
            "no instrument universe could be resolved (tried: all, twii)"
        );
    }
}
