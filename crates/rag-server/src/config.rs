//! Server Configuration

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use course_search::DEFAULT_MAX_RESULTS;
use rag_core::orchestrator::DEFAULT_MAX_ROUNDS;
use rag_core::session::DEFAULT_MAX_HISTORY;

/// Settings read from the environment at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Listen address
    pub bind_addr: String,

    /// Course catalog JSON; an empty catalog is used when unset
    pub courses_path: Option<PathBuf>,

    /// Directory of static frontend files, if any
    pub static_dir: Option<PathBuf>,

    /// Chunks returned per search
    pub max_results: usize,

    /// Exchanges remembered per session
    pub max_history: usize,

    /// Tool rounds per query
    pub max_rounds: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".into()),
            courses_path: lookup("COURSES_PATH").map(PathBuf::from),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
            max_results: parse_or(&lookup, "MAX_RESULTS", DEFAULT_MAX_RESULTS)?,
            max_history: parse_or(&lookup, "MAX_HISTORY", DEFAULT_MAX_HISTORY)?,
            max_rounds: parse_or(&lookup, "MAX_ROUNDS", DEFAULT_MAX_ROUNDS)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .with_context(|| format!("invalid {key}: {raw:?}"))
    })
}
