// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Veriscan capture SDK.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::VeriscanError;

/// Unique identifier for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a processing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classes of card the recognition engine can extract fields from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    DriversLicense,
    MedicalInsurance,
    Passport,
}

/// Issuing region of a card. Drives which recognition profile the engine
/// applies; `General` lets the engine pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardRegion {
    UnitedStates,
    Canada,
    LatinAmerica,
    Europe,
    Asia,
    Australia,
    General,
}

/// Orientation of the on-screen HUD messages shown during capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HudOrientation {
    Landscape,
    Portrait,
}

/// Placement rectangle for a HUD message, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudFrame {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// RGBA background colour for a HUD message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

/// A customisable HUD message (initial hint or capturing hint) displayed by
/// the capture surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudMessage {
    pub text: String,
    pub frame: HudFrame,
    pub color: HudColor,
    /// How long the message stays on screen, in milliseconds.
    pub duration_ms: u32,
    pub orientation: HudOrientation,
}

/// Encoded card imagery (JPEG or PNG bytes) moving between the capture
/// surface, the coordinators, and the recognition engine.
///
/// This layer treats the pixel content as opaque; only the crop pipeline
/// decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImage {
    pub data: Vec<u8>,
}

impl CardImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Options accompanying a processing request.
///
/// The card type is deliberately optional here so that its absence can be
/// rejected with a validation error instead of silently defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub card_type: Option<CardType>,
    pub region: CardRegion,
    /// Let the engine infer the issuing state/province from the imagery.
    pub auto_detect_state: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            card_type: None,
            region: CardRegion::UnitedStates,
            auto_detect_state: false,
        }
    }
}

impl ProcessOptions {
    /// Options for a specific card type and region.
    pub fn for_card(card_type: CardType, region: CardRegion) -> Self {
        Self {
            card_type: Some(card_type),
            region,
            ..Self::default()
        }
    }
}

/// Verdict returned by the license validation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseVerdict {
    pub validated: bool,
    pub reason: Option<String>,
}

impl LicenseVerdict {
    pub fn valid() -> Self {
        Self {
            validated: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            validated: false,
            reason: Some(reason.into()),
        }
    }
}

/// Fields extracted from a driver's license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriversLicenseFields {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub license_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub issue_date: Option<String>,
    pub expiration_date: Option<String>,
    pub license_class: Option<String>,
    pub state_or_province: Option<String>,
    pub sex: Option<String>,
}

/// Fields extracted from a medical insurance card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalInsuranceFields {
    pub member_name: Option<String>,
    pub member_id: Option<String>,
    pub group_number: Option<String>,
    pub plan_provider: Option<String>,
    pub effective_date: Option<String>,
    pub copay_details: Option<String>,
}

/// Fields extracted from a passport data page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportFields {
    pub full_name: Option<String>,
    pub passport_number: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<String>,
    pub expiration_date: Option<String>,
    pub mrz_line1: Option<String>,
    pub mrz_line2: Option<String>,
}

/// Structured result produced by the recognition engine.
///
/// Passed through to observers verbatim; this layer never inspects or
/// mutates the extracted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardResult {
    DriversLicense(DriversLicenseFields),
    MedicalInsurance(MedicalInsuranceFields),
    Passport(PassportFields),
}

impl CardResult {
    /// The card class this result was extracted from.
    pub fn card_type(&self) -> CardType {
        match self {
            Self::DriversLicense(_) => CardType::DriversLicense,
            Self::MedicalInsurance(_) => CardType::MedicalInsurance,
            Self::Passport(_) => CardType::Passport,
        }
    }
}

/// Terminal outcome of a capture session, as produced by the capture surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A still card image was captured.
    Image { image: CardImage, back_side: bool },
    /// A barcode was decoded from the card's barcode side.
    Barcode(String),
    /// The user pressed the back button.
    BackPressed,
}

/// Validated cloud endpoint for license activation.
///
/// Construction enforces an absolute URL with a scheme and a host, so the
/// rest of the codebase can assume the address is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudAddress(Url);

impl CloudAddress {
    /// Parse and validate an endpoint string, e.g. `https://myserver.com/`.
    pub fn parse(raw: &str) -> Result<Self, VeriscanError> {
        let url = Url::parse(raw)
            .map_err(|e| VeriscanError::MalformedEndpoint(format!("'{raw}': {e}")))?;
        if url.host().is_none() {
            return Err(VeriscanError::MalformedEndpoint(format!(
                "'{raw}': missing host"
            )));
        }
        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CloudAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
