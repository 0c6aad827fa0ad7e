// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Veriscan — Core types, errors, and observer contracts shared across all crates.

pub mod config;
pub mod error;
pub mod observer;
pub mod types;

pub use config::CaptureConfig;
pub use error::VeriscanError;
pub use observer::{CaptureObserver, LicenseObserver, ProcessingObserver};
pub use types::*;
