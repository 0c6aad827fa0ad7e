// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Veriscan — License activation: state machine, verdict cache, and key
// fingerprinting.

pub mod cache;
pub mod fingerprint;
pub mod gate;

pub use cache::VerdictCache;
pub use fingerprint::fingerprint_key;
pub use gate::{ActivationGate, LicenseState, WatcherSlot};
