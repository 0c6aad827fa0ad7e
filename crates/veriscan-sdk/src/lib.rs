// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Public surface of the Veriscan SDK.
//!
//! Hosts obtain the singleton [`CaptureController`] through a
//! [`SessionRegistry`], wire up observers, and drive the capture and
//! processing flows through the controller's imperative methods. All
//! long-running work is reported asynchronously through the observer
//! traits in `veriscan-core`.

pub mod controller;
pub mod registry;
pub mod telemetry;

pub use controller::CaptureController;
pub use registry::{Backends, SessionRegistry};

pub use veriscan_capture::CapturePhase;
pub use veriscan_core::{
    CaptureConfig, CaptureObserver, CaptureOutcome, CardImage, CardRegion, CardResult, CardType,
    HudColor, HudFrame, HudMessage, HudOrientation, ProcessOptions, ProcessingObserver,
    VeriscanError,
};
pub use veriscan_engine::{CaptureSurface, LicenseService, RecognitionEngine};
pub use veriscan_license::LicenseState;
pub use veriscan_process::RequestPhase;
