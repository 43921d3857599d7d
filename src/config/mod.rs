use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub decay: DecayConfig,
    pub recommendation: RecommendationConfig,
    pub diversity: DiversityConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port).parse().unwrap()
    }
}

/// Time decay applied to behavioral scores: `1 / (1 + rate * days)`,
/// floored at `min_factor` so ancient interactions keep a residual weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    pub rate: f64,
    pub min_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub content_weight: f64,
    pub collab_weight: f64,
    pub limit: usize,
    pub top_k_neighbors: usize,
    /// Cell patches tolerated before the similarity matrices are considered
    /// stale enough to warrant a full rebuild; they are never refreshed
    /// incrementally. Crossing the bound logs a warning and shows up in the
    /// model status report.
    pub max_stale_patches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    pub max_per_location: usize,
    pub max_per_type: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub test_ratio: f64,
    pub seed: u64,
    pub k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            decay: DecayConfig::default(),
            recommendation: RecommendationConfig::default(),
            diversity: DiversityConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            rate: 0.05,
            min_factor: 0.1,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.5,
            collab_weight: 0.5,
            limit: 10,
            top_k_neighbors: 20,
            max_stale_patches: 100,
        }
    }
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            max_per_location: 3,
            max_per_type: 4,
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            k: 10,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("STAYREC"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
