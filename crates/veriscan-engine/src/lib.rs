// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Veriscan — Boundary contracts for the opaque external collaborators.
//
// The actual image recognition, license-key cryptography, and capture UI
// rendering live in precompiled vendor components. This crate defines the
// traits the session core talks to, plus scripted in-process doubles used by
// tests and non-device builds.

pub mod stub;
pub mod traits;

pub use traits::{
    CaptureRequest, CaptureSurface, EngineRequest, LicenseService, RecognitionEngine,
    SurfaceChrome,
};
