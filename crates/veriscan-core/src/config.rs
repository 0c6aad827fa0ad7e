// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture configuration.

use serde::{Deserialize, Serialize};

use crate::error::VeriscanError;
use crate::types::HudMessage;

/// Mutable display and sizing parameters consumed by the capture coordinator
/// when presenting the capture surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Target width of the cropped card image, in pixels. Only applied when
    /// the height is also set.
    pub crop_width: Option<u32>,
    /// Target height of the cropped card image, in pixels. Only applied when
    /// the width is also set.
    pub crop_height: Option<u32>,
    /// Whether images captured on the barcode side may be cropped.
    pub can_crop_barcode: bool,
    /// HUD message shown when the capture surface first appears.
    pub initial_message: Option<HudMessage>,
    /// HUD message shown while a frame is being captured.
    pub capturing_message: Option<HudMessage>,
}

impl CaptureConfig {
    /// The effective crop dimensions.
    ///
    /// Width and height are paired: both set yields `Some((w, h))`, neither
    /// set yields `None`, and exactly one set is a configuration error.
    pub fn crop_dimensions(&self) -> Result<Option<(u32, u32)>, VeriscanError> {
        match (self.crop_width, self.crop_height) {
            (Some(w), Some(h)) => Ok(Some((w, h))),
            (None, None) => Ok(None),
            _ => Err(VeriscanError::UnpairedCropDimensions),
        }
    }
}
