// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Background card processing for Veriscan.
//!
//! One [`ProcessingCoordinator`] per controller. Requests are single-flight:
//! while a recognition request is with the engine, further requests are
//! dropped on the floor rather than queued, matching the one-card-at-a-time
//! workflow of the capture UI.

pub mod coordinator;

pub use coordinator::{ProcessingCoordinator, RequestPhase};
