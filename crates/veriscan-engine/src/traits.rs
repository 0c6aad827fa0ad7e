// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the three external collaborators.
//
// Each call is atomic from the session core's point of view: no partial
// results, no progress callbacks. Completion or failure is the only signal.

use async_trait::async_trait;

use veriscan_core::error::Result;
use veriscan_core::{
    CaptureConfig, CaptureObserver, CaptureOutcome, CardImage, CardRegion, CardResult, CardType,
    CloudAddress, LicenseVerdict, SessionId,
};

/// One submission of imagery and options to the recognition engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Front-of-card image. Always present — the processing coordinator
    /// rejects requests without one before this type is ever built.
    pub front: CardImage,
    /// Optional back-of-card image.
    pub back: Option<CardImage>,
    /// Optional side-channel payload (e.g. pre-decoded barcode data).
    pub side_data: Option<String>,
    pub card_type: CardType,
    pub region: CardRegion,
}

/// Observer-supplied answers to the surface customisation queries,
/// snapshotted when the interface is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceChrome {
    pub watermark_text: Option<String>,
    pub show_back_button: bool,
    pub show_flash_button: bool,
    pub barcode_error_message: Option<String>,
    pub barcode_error_delay_secs: u32,
}

impl SurfaceChrome {
    /// Query the observer for its customisation choices.
    pub fn from_observer(observer: &dyn CaptureObserver) -> Self {
        Self {
            watermark_text: observer.watermark_text(),
            show_back_button: observer.show_back_button(),
            show_flash_button: observer.show_flash_button(),
            barcode_error_message: observer.barcode_error_message(),
            barcode_error_delay_secs: observer.barcode_error_delay_secs(),
        }
    }
}

impl Default for SurfaceChrome {
    fn default() -> Self {
        Self {
            watermark_text: None,
            show_back_button: true,
            show_flash_button: true,
            barcode_error_message: None,
            barcode_error_delay_secs: 2,
        }
    }
}

/// Presentation request handed to the capture surface renderer.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub session: SessionId,
    pub card_type: CardType,
    pub region: CardRegion,
    /// Whether this session captures the barcode side of the card.
    pub barcode_side: bool,
    /// Display and sizing parameters for the surface chrome.
    pub config: CaptureConfig,
    /// Observer-customised chrome choices.
    pub chrome: SurfaceChrome,
}

/// The recognition engine: consumes imagery and options, produces a
/// structured result or an error. Treated as a black box.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    async fn process_card(&self, request: EngineRequest) -> Result<CardResult>;
}

/// The license validation service behind the configured cloud endpoint.
#[async_trait]
pub trait LicenseService: Send + Sync {
    async fn validate_key(&self, key: &str, endpoint: &CloudAddress) -> Result<LicenseVerdict>;
}

/// The capture surface renderer: owns camera frames and UI chrome, and
/// resolves to exactly one terminal outcome per presentation.
///
/// The returned future is cancelled (dropped) when the caller dismisses the
/// interface before an outcome is produced.
#[async_trait]
pub trait CaptureSurface: Send + Sync {
    async fn run(&self, request: CaptureRequest) -> Result<CaptureOutcome>;
}
