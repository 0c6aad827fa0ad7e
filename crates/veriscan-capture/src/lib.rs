// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Veriscan — Capture coordinator: camera lifecycle, the capture session
// state machine, and the crop pipeline applied to captured frames.

pub mod coordinator;
pub mod crop;

pub use coordinator::{CaptureCoordinator, CapturePhase};
