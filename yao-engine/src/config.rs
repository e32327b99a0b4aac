//! Per-computation configuration.

use crate::errors::YaoError;
use serde::{Deserialize, Serialize};

/// Which oblivious transfer flavor delivers labels for inputs the evaluator
/// owns. Both parties must agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtFlavor {
    /// General 1-out-of-2 OT: the garbler picks both labels and transfers
    /// them.
    General,
    /// Fixed-XOR-correlated OT: the transfer itself produces the zero label,
    /// the one label is offset by the global delta.
    FixedCorrelated,
}

/// Configuration of one party's run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YaoConfig {
    /// Size of the executor's worker pool; `0` or `1` means single-threaded.
    pub num_threads: usize,
    /// OT flavor for evaluator-owned inputs.
    pub ot_flavor: OtFlavor,
    /// Whether the phase-separated mode runs the synchronization barrier
    /// between setup and online.
    pub sync_between_setup_and_online: bool,
    /// Seed for label randomness. Random when unset.
    pub seed: Option<u64>,
}

impl Default for YaoConfig {
    fn default() -> Self {
        YaoConfig {
            num_threads: 1,
            ot_flavor: OtFlavor::FixedCorrelated,
            sync_between_setup_and_online: true,
            seed: None,
        }
    }
}

impl YaoConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, YaoError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration as JSON.
    pub fn to_json(&self) -> Result<String, YaoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the executor should use more than one thread.
    pub fn is_multi_threaded(&self) -> bool {
        self.num_threads > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        assert_eq!(YaoConfig::from_json("{}").unwrap(), YaoConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = YaoConfig {
            num_threads: 4,
            ot_flavor: OtFlavor::General,
            sync_between_setup_and_online: false,
            seed: Some(42),
        };
        let parsed = YaoConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
        assert!(parsed.is_multi_threaded());
    }

    #[test]
    fn test_partial_json() {
        let config = YaoConfig::from_json(r#"{"ot_flavor": "general", "num_threads": 3}"#).unwrap();
        assert_eq!(config.ot_flavor, OtFlavor::General);
        assert_eq!(config.num_threads, 3);
        assert!(config.sync_between_setup_and_online);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            YaoConfig::from_json(r#"{"ot_flavor": "quantum"}"#),
            Err(YaoError::InvalidConfig(_))
        ));
    }
}
