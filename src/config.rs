//! Command-line configuration.
//!
//! [`Args`] is the raw `clap` surface; [`Settings`] is the typed form the
//! rest of the program is built from.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::query::DEFAULT_MIN_UPDATE_INTERVAL;
use crate::render::{CappingPolicy, RenderConfig};
use crate::source::{SourceConfig, SourceKind};

#[derive(Debug, Parser)]
#[command(
    name = "multivid-search",
    version,
    about = "Search box with live suggestions and provider-balanced results"
)]
pub struct Args {
    /// Initial query; searched immediately on startup.
    pub query: Option<String>,

    /// Base URL of the search backend.
    #[arg(long, default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Endpoint serving autocomplete suggestions.
    #[arg(long, default_value = "/search/autocomplete")]
    pub suggest_endpoint: String,

    /// Endpoint serving full search results.
    #[arg(long, default_value = "/search/find")]
    pub find_endpoint: String,

    /// Quiet window after the last keystroke before searching.
    #[arg(long, default_value_t = DEFAULT_MIN_UPDATE_INTERVAL.as_millis() as u64)]
    pub min_update_interval_ms: u64,

    /// Maximum suggestions shown.
    #[arg(long, default_value_t = 10)]
    pub max_suggestions: usize,

    /// Maximum results shown.
    #[arg(long, default_value_t = 18)]
    pub max_results: usize,

    /// Capping rule for the suggestion list.  Autocomplete answers arrive
    /// grouped by provider, so first-n lets the first provider fill the list.
    #[arg(long, value_enum, default_value_t = CappingPolicy::FairByProvider)]
    pub suggestion_capping: CappingPolicy,

    /// Capping rule for the result list.
    #[arg(long, value_enum, default_value_t = CappingPolicy::FairByProvider)]
    pub result_capping: CappingPolicy,

    /// Apply responses in arrival order even when a newer query was issued.
    #[arg(long)]
    pub legacy_accept_stale: bool,

    /// Write logs to this file (the terminal is taken by the UI).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub initial_query: Option<String>,
    pub min_update_interval: Duration,
    pub suggestions: SourceConfig,
    pub results: SourceConfig,
    pub suggestion_render: RenderConfig,
    pub result_render: RenderConfig,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            base_url: args.base_url,
            initial_query: args.query.filter(|q| !q.trim().is_empty()),
            min_update_interval: Duration::from_millis(args.min_update_interval_ms),
            suggestions: SourceConfig {
                kind: SourceKind::Suggestions,
                endpoint: args.suggest_endpoint,
                accept_stale: args.legacy_accept_stale,
            },
            results: SourceConfig {
                kind: SourceKind::Results,
                endpoint: args.find_endpoint,
                accept_stale: args.legacy_accept_stale,
            },
            suggestion_render: RenderConfig {
                max_rendered: args.max_suggestions,
                policy: args.suggestion_capping,
            },
            result_render: RenderConfig {
                max_rendered: args.max_results,
                policy: args.result_capping,
            },
            log_file: args.log_file,
            log_level: args.log_level,
        }
    }
}
