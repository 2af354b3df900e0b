// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Expand a bare level into a filter that quiets the HTTP stack.
/// Custom directive strings (with ',' or '=') are respected as-is.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    let normalized = if normalized.is_empty() {
        "info"
    } else {
        normalized
    };
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!(
            "{},h2=info,hyper=info,hyper_util=info,reqwest=info,rustls=info,alloy_transport_http=info,alloy_rpc_client=info",
            normalized
        )
    }
}

pub fn setup_logging(log_level: &str) {
    let filter_spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(true).compact();
    // `try_init` so a second call (tests, embedding) is a no-op instead of a panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    let base = filter_spec.split(',').next().unwrap_or("info").trim();
    tracing::info!("Logging initialized\n  base: {base}\n  format: compact");
}
