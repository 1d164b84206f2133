//! Runtime configuration read from the environment (and `.env` if present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::algorithm::branch_bound::SearchLimits;
use crate::algorithm::scorer::BoundPolicy;
use crate::algorithm::seeds::DEFAULT_SEED_COUNT;

pub const DEFAULT_DB_PATH: &str = "ttrec.db";
pub const DEFAULT_TOP_N: usize = 3;

/// Knobs of a recommendation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendSettings {
    pub seed_count: usize,
    pub top_n: usize,
    pub bound: BoundPolicy,
    pub limits: SearchLimits,
    /// Run seed searches on worker threads. Output is identical either way.
    pub parallel: bool,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        RecommendSettings {
            seed_count: DEFAULT_SEED_COUNT,
            top_n: DEFAULT_TOP_N,
            bound: BoundPolicy::Reference,
            limits: SearchLimits::default(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub recommend: RecommendSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            recommend: RecommendSettings::default(),
        }
    }
}

impl FromStr for BoundPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reference" => Ok(BoundPolicy::Reference),
            "optimistic" => Ok(BoundPolicy::Optimistic),
            other => Err(format!("unknown bound policy {:?}", other)),
        }
    }
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("{:?} is not a boolean", other)),
    }
}

impl Config {
    /// Loads `.env` first, then reads the `TTREC_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Bad values keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        if let Some(p) = lookup("TTREC_DB_PATH") {
            // accept sqlite:// and file:// URLs as plain paths
            let path = p
                .strip_prefix("sqlite://")
                .or_else(|| p.strip_prefix("file://"))
                .unwrap_or(&p);
            cfg.db_path = PathBuf::from(path);
        }

        let read = |key: &str| -> Option<String> { lookup(key).filter(|v| !v.trim().is_empty()) };

        if let Some(v) = read("TTREC_SEEDS") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.recommend.seed_count = n,
                _ => warn!(value = %v, "ignoring invalid TTREC_SEEDS"),
            }
        }
        if let Some(v) = read("TTREC_TOP_N") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.recommend.top_n = n,
                _ => warn!(value = %v, "ignoring invalid TTREC_TOP_N"),
            }
        }
        if let Some(v) = read("TTREC_MAX_NODES") {
            match v.trim().parse::<u64>() {
                Ok(n) if n > 0 => cfg.recommend.limits.max_nodes = Some(n),
                _ => warn!(value = %v, "ignoring invalid TTREC_MAX_NODES"),
            }
        }
        if let Some(v) = read("TTREC_BOUND") {
            match v.parse::<BoundPolicy>() {
                Ok(b) => cfg.recommend.bound = b,
                Err(e) => warn!(error = %e, "ignoring invalid TTREC_BOUND"),
            }
        }
        if let Some(v) = read("TTREC_PARALLEL") {
            match parse_flag(&v) {
                Ok(b) => cfg.recommend.parallel = b,
                Err(e) => warn!(error = %e, "ignoring invalid TTREC_PARALLEL"),
            }
        }
        cfg
    }
}
