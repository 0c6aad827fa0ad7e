// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Tracing setup for host applications that have no subscriber of their
//! own. Embedders with an existing `tracing` pipeline should skip this.

/// Install a formatting subscriber honouring `RUST_LOG`, defaulting to
/// `info`. Call at most once, before any SDK activity.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
