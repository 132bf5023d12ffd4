//! Taxpare: comparable selection, adjustment, and AI-assisted ranking
//! for residential property tax appeals.
//!
//! The crate is a library-first pipeline. A caller loads a subject
//! property and a pool of candidate comparables, then runs
//! [`pipeline::PropertyAnalyzer::analyze`] to get a ranked top-5 with
//! exclusions and a valuation summary. Every stage is exposed on its
//! own so frontends can re-render intermediate results (selection
//! grids, the audit prompt) without re-running the ranking call.

pub mod adjustments;
pub mod config;
pub mod format;
pub mod pipeline;
pub mod prompt;
pub mod property;
pub mod ranking;
pub mod selection;
pub mod summary;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise [`config::default_log_filter`]
/// keeps this crate at debug and everything else at info. Call once
/// from the binary or host application, never from library code.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
