//! Selection tuning and service configuration from environment.

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use crate::{
    assembler::AssemblerConfig,
    densify::DensifyConfig,
    google::{DEFAULT_DIRECTIONS_URL, DEFAULT_ROADS_URL},
    scoring::ScoreWeights,
    waypoints::DEFAULT_OFFSET_FRACTIONS,
};

const DEFAULT_WEIGHTS_PATH: &str = "backend/data/subregion_weights.json";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CONCURRENCY: usize = 4;

/// Parameters of one selection run.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub densify: DensifyConfig,
    pub offset_fractions: Vec<f64>,
    pub assembler: AssemblerConfig,
    pub score_weights: ScoreWeights,
    /// Fewer surviving candidates than this is an error, not a winner.
    pub min_candidates: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            densify: DensifyConfig::default(),
            offset_fractions: DEFAULT_OFFSET_FRACTIONS.to_vec(),
            assembler: AssemblerConfig::default(),
            score_weights: ScoreWeights::default(),
            min_candidates: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub api_key: String,
    pub directions_url: String,
    pub roads_url: String,
    pub weights_path: PathBuf,
    pub provider_timeout: Duration,
    pub max_concurrent_requests: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("GOOGLE_MAPS_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("GOOGLE_MAPS_API_KEY"))?;

        Ok(Self {
            addr: parse_or(&lookup, "SAFEWALK_ADDR", || {
                SocketAddr::from(([0, 0, 0, 0], 8080))
            })?,
            api_key,
            directions_url: lookup("GOOGLE_DIRECTIONS_URL")
                .unwrap_or_else(|| DEFAULT_DIRECTIONS_URL.to_string()),
            roads_url: lookup("GOOGLE_ROADS_URL").unwrap_or_else(|| DEFAULT_ROADS_URL.to_string()),
            weights_path: lookup("SUBREGION_WEIGHTS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WEIGHTS_PATH)),
            provider_timeout: Duration::from_millis(parse_or(
                &lookup,
                "PROVIDER_TIMEOUT_MS",
                || DEFAULT_TIMEOUT_MS,
            )?),
            max_concurrent_requests: parse_or(&lookup, "PROVIDER_CONCURRENCY", || {
                DEFAULT_CONCURRENCY
            })?,
        })
    }

    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig {
            assembler: AssemblerConfig {
                provider_timeout: self.provider_timeout,
                max_concurrent_requests: self.max_concurrent_requests,
                ..AssemblerConfig::default()
            },
            ..SelectionConfig::default()
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default()),
    }
}
