// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key fingerprinting — SHA-256 so raw license keys never land in the cache.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of a license key as a lowercase hex
/// string.
///
/// The verdict cache stores fingerprints, never the key itself, so a leaked
/// cache database does not leak the key.
pub fn fingerprint_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
