// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Observer contracts through which all asynchronous results are delivered.
//
// The controller holds observers weakly: if an observer is dropped while a
// session or request is outstanding, delivery of the terminal event becomes
// a no-op rather than a fault. Methods with default bodies are optional —
// implementors override only what they care about.

use crate::error::VeriscanError;
use crate::types::{CardImage, CardResult};

/// Events and customisation queries for the capture flow.
///
/// Exactly one of `image_captured`, `barcode_captured`, `back_pressed`, or
/// `capture_failed` is delivered per capture session.
pub trait CaptureObserver: Send + Sync {
    /// A card image was captured. `back_side` is true for the back of the card.
    fn image_captured(&self, image: CardImage, back_side: bool);

    /// A barcode was decoded from the card.
    fn barcode_captured(&self, data: String);

    /// The capture session failed. The observer is in charge of analysing
    /// the error and informing the user.
    fn capture_failed(&self, error: VeriscanError);

    /// The user pressed the back button.
    fn back_pressed(&self) {}

    /// The license key was validated (or rejected).
    fn license_validated(&self, _validated: bool) {}

    // -- Capture surface lifecycle -------------------------------------------

    fn interface_did_appear(&self) {}

    fn interface_will_disappear(&self) {}

    fn interface_did_disappear(&self) {}

    // -- Surface customisation queries ---------------------------------------
    //
    // Consulted by the capture surface renderer when building its chrome.
    // Defaults match the stock interface.

    /// Watermark text overlaid on the live preview, if any.
    fn watermark_text(&self) -> Option<String> {
        None
    }

    /// Whether the back button is shown.
    fn show_back_button(&self) -> bool {
        true
    }

    /// Whether the flashlight toggle is shown.
    fn show_flash_button(&self) -> bool {
        true
    }

    /// Error text shown when a barcode refuses to scan, if customised.
    fn barcode_error_message(&self) -> Option<String> {
        None
    }

    /// Seconds before the barcode error message appears.
    fn barcode_error_delay_secs(&self) -> u32 {
        2
    }
}

/// Events for the processing flow.
///
/// Exactly one of `card_processed` or `processing_failed` is delivered per
/// processing request.
pub trait ProcessingObserver: Send + Sync {
    /// The request completed successfully with extracted fields.
    fn card_processed(&self, result: CardResult);

    /// The request failed.
    fn processing_failed(&self, error: VeriscanError);

    /// The license key was validated (or rejected).
    fn license_validated(&self, _validated: bool) {}
}

/// Sink for license validation notifications.
///
/// The activation gate notifies registered watchers once per state
/// transition; adapters bridge these notifications onto the optional
/// `license_validated` methods of the two observer traits.
pub trait LicenseObserver: Send + Sync {
    fn license_validated(&self, validated: bool);
}
