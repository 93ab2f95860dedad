//! Engine configuration (`spec.md` §6.3), loadable from a TOML file or
//! environment variables. Parsing is ambient plumbing a driver uses to
//! build the struct it hands to [`crate::engine::Engine::init`]; the
//! engine itself never reads the environment.

use serde::{Deserialize, Serialize};

use addd_rules_evbdd::NormStrategy;
use addd_weight::WeightBackendKind;

fn default_workers() -> usize {
    1
}

fn default_table_min() -> usize {
    1 << 16
}

fn default_table_max() -> usize {
    1 << 24
}

fn default_cache_min() -> usize {
    1 << 16
}

fn default_cache_max() -> usize {
    1 << 20
}

fn default_weight_table_max() -> usize {
    1 << 23
}

fn default_tolerance() -> f64 {
    1e-14
}

/// Mirrors `spec.md` §6.3's recognized flags. `norm_strategy` and
/// `weight_backend` are serialized as their lowercase spec names
/// (`low`/`largest`/`min`/`l2`, `hashmap`/`real-tuple-hashmap`/
/// `real-tree`) via the `#[serde(rename_all)]` below.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_table_min")]
    pub node_table_min: usize,
    #[serde(default = "default_table_max")]
    pub node_table_max: usize,
    #[serde(default = "default_table_min")]
    pub weight_table_min: usize,
    #[serde(default = "default_weight_table_max")]
    pub weight_table_max: usize,
    #[serde(default = "default_cache_min")]
    pub cache_min: usize,
    #[serde(default = "default_cache_max")]
    pub cache_max: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(rename = "weight-backend")]
    pub weight_backend: ConfigWeightBackend,
    #[serde(rename = "norm-strategy")]
    pub norm_strategy: ConfigNormStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workers: default_workers(),
            node_table_min: default_table_min(),
            node_table_max: default_table_max(),
            weight_table_min: default_table_min(),
            weight_table_max: default_weight_table_max(),
            cache_min: default_cache_min(),
            cache_max: default_cache_max(),
            tolerance: default_tolerance(),
            weight_backend: ConfigWeightBackend::Hashmap,
            norm_strategy: ConfigNormStrategy::Low,
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML source (e.g. a file a driver has read).
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Overlay `ADDD_*` environment variables onto `self`. Unset
    /// variables leave the corresponding field untouched; malformed
    /// ones are ignored rather than failing the whole load, since a
    /// misconfigured single flag shouldn't prevent `init` from running
    /// with every other default intact.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ADDD_WORKERS") {
            if let Ok(n) = v.parse() {
                self.workers = n;
            }
        }
        if let Ok(v) = std::env::var("ADDD_TOLERANCE") {
            if let Ok(t) = v.parse() {
                self.tolerance = t;
            }
        }
        if let Ok(v) = std::env::var("ADDD_NORM_STRATEGY") {
            if let Some(s) = ConfigNormStrategy::from_flag(&v) {
                self.norm_strategy = s;
            }
        }
        if let Ok(v) = std::env::var("ADDD_WEIGHT_BACKEND") {
            if let Some(b) = ConfigWeightBackend::from_flag(&v) {
                self.weight_backend = b;
            }
        }
    }

    pub fn norm_strategy(&self) -> NormStrategy {
        self.norm_strategy.into()
    }

    pub fn weight_backend(&self) -> WeightBackendKind {
        self.weight_backend.into()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigNormStrategy {
    Low,
    Largest,
    Min,
    L2,
}

impl ConfigNormStrategy {
    fn from_flag(s: &str) -> Option<Self> {
        match s {
            "low" => Some(ConfigNormStrategy::Low),
            "largest" => Some(ConfigNormStrategy::Largest),
            "min" => Some(ConfigNormStrategy::Min),
            "l2" => Some(ConfigNormStrategy::L2),
            _ => None,
        }
    }
}

impl From<ConfigNormStrategy> for NormStrategy {
    fn from(s: ConfigNormStrategy) -> Self {
        match s {
            ConfigNormStrategy::Low => NormStrategy::Low,
            ConfigNormStrategy::Largest => NormStrategy::Largest,
            ConfigNormStrategy::Min => NormStrategy::Min,
            ConfigNormStrategy::L2 => NormStrategy::L2,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigWeightBackend {
    Hashmap,
    RealTupleHashmap,
    RealTree,
}

impl ConfigWeightBackend {
    fn from_flag(s: &str) -> Option<Self> {
        match s {
            "hashmap" => Some(ConfigWeightBackend::Hashmap),
            "real-tuple-hashmap" => Some(ConfigWeightBackend::RealTupleHashmap),
            "real-tree" => Some(ConfigWeightBackend::RealTree),
            _ => None,
        }
    }
}

impl From<ConfigWeightBackend> for WeightBackendKind {
    fn from(b: ConfigWeightBackend) -> Self {
        match b {
            ConfigWeightBackend::Hashmap => WeightBackendKind::Hashmap,
            ConfigWeightBackend::RealTupleHashmap => WeightBackendKind::RealTupleHashmap,
            ConfigWeightBackend::RealTree => WeightBackendKind::RealTree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.tolerance, 1e-14);
        assert_eq!(cfg.norm_strategy, ConfigNormStrategy::Low);
        assert_eq!(cfg.weight_backend, ConfigWeightBackend::Hashmap);
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let cfg = EngineConfig::from_toml_str("workers = 4\ntolerance = 1e-9\n").unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.tolerance, 1e-9);
        assert_eq!(cfg.weight_backend, ConfigWeightBackend::Hashmap);
    }
}
