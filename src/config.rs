//! Runtime Configuration
//!
//! Two independent settings groups:
//! - **`ServerConfig`**: where the HTTP server binds and which seed file (if any) is
//!   bulk-loaded at start-up. Parsed from command-line flags.
//! - **`SearchConfig`**: tolerances of the fuzzy matcher, cache lifetime and result-size
//!   defaults of the search service.

use crate::search::fuzzy::MatchOptions;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Result size of a search that carries a query or a filter.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// Result size of a plain listing (no query, no filter).
pub const DEFAULT_LISTING_LIMIT: usize = 100;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub seed_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Parses `--bind <addr:port>` and `--books <path.json>`.
    ///
    /// The first element is the program name and is skipped.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut bind_addr: SocketAddr = DEFAULT_BIND.parse()?;
        let mut seed_file = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--bind" => {
                    let value = args.get(i + 1).context("--bind requires a value")?;
                    bind_addr = value
                        .parse()
                        .with_context(|| format!("invalid bind address: {}", value))?;
                    i += 2;
                }
                "--books" => {
                    let value = args.get(i + 1).context("--books requires a value")?;
                    seed_file = Some(PathBuf::from(value));
                    i += 2;
                }
                other => {
                    tracing::warn!("Ignoring unknown argument: {}", other);
                    i += 1;
                }
            }
        }

        Ok(Self {
            bind_addr,
            seed_file,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Highest accepted per-field match score (0 = exact, 1 = anything).
    pub threshold: f64,
    /// How far from `location` a match may start before it is rejected.
    pub distance: usize,
    /// Character offset where matches are expected to begin.
    pub location: usize,
    /// Shortest run of matched characters worth reporting.
    pub min_match_len: usize,
    pub cache_ttl: Duration,
    pub default_limit: usize,
    pub listing_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            distance: 100,
            location: 0,
            min_match_len: 2,
            cache_ttl: DEFAULT_CACHE_TTL,
            default_limit: DEFAULT_QUERY_LIMIT,
            listing_limit: DEFAULT_LISTING_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            threshold: self.threshold,
            distance: self.distance,
            location: self.location,
            min_match_len: self.min_match_len,
        }
    }
}
