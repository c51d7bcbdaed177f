//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Browser endpoint used when none is given.
///
/// Chromium prints the real one (with its id) on startup with
/// `--remote-debugging-port=9222`.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:9222/devtools/browser";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub endpoint: String,
    pub url: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// `--endpoint <ws-url>`, `--url <page-url>` and `--debug`.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            endpoint: value_of("--endpoint").unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            url: value_of("--url"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "devtools_link=trace"
    } else {
        "devtools_link=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
