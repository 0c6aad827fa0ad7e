// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop pipeline — centre-crops captured card frames to the configured
// dimensions using the `image` crate.

use std::io::Cursor;

use image::ImageFormat;
use tracing::debug;

use veriscan_core::CardImage;
use veriscan_core::error::VeriscanError;

/// Centre-crop `image` to at most `width` × `height` pixels and re-encode
/// as PNG.
///
/// Requested dimensions larger than the source are clamped to the source
/// edge rather than padded, so the output never upscales.
pub fn crop_to(image: &CardImage, width: u32, height: u32) -> Result<CardImage, VeriscanError> {
    let decoded = image::load_from_memory(&image.data)
        .map_err(|e| VeriscanError::ImageError(format!("decode: {e}")))?;

    let crop_w = width.min(decoded.width());
    let crop_h = height.min(decoded.height());
    let x = (decoded.width() - crop_w) / 2;
    let y = (decoded.height() - crop_h) / 2;

    let cropped = decoded.crop_imm(x, y, crop_w, crop_h);
    debug!(
        from_w = decoded.width(),
        from_h = decoded.height(),
        to_w = crop_w,
        to_h = crop_h,
        "captured frame cropped"
    );

    let mut buffer = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| VeriscanError::ImageError(format!("encode: {e}")))?;
    Ok(CardImage::new(buffer.into_inner()))
}
