// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Veriscan.

use thiserror::Error;

/// Top-level error type for all Veriscan operations.
///
/// User-initiated cancellation (back button, dismiss) is NOT an error — it is
/// reported through the `back_pressed` observer callback instead.
#[derive(Debug, Error)]
pub enum VeriscanError {
    // -- Licensing errors --
    #[error("license key has not been validated")]
    NotLicensed,

    #[error("license key was rejected: {0}")]
    LicenseRejected(String),

    // -- Configuration errors --
    #[error("no capture surface was supplied")]
    MissingCaptureSurface,

    #[error("malformed cloud endpoint: {0}")]
    MalformedEndpoint(String),

    #[error("crop width and crop height must be set together")]
    UnpairedCropDimensions,

    // -- Request validation errors --
    #[error("a front card image is required")]
    MissingFrontImage,

    #[error("card type not specified in process options")]
    CardTypeNotSpecified,

    // -- Engine errors --
    #[error("recognition engine failure: {0}")]
    Engine(String),

    #[error("unsupported card type or region: {0}")]
    UnsupportedCard(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    // -- Imagery --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VeriscanError>;
