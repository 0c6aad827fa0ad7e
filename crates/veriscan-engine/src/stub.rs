// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted stand-ins for the vendor components, used by tests and by
// desktop/CI builds where the real engine and capture surface are
// unavailable.
//
// Each stub records the requests it receives and can be scripted with
// queued outcomes. `hold()` parks the next call until `release()`, which is
// how tests pin a request in flight; the permit-based wakeup assumes one
// parked call at a time, which is all the single-flight protocol allows
// anyway.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use veriscan_core::error::{Result, VeriscanError};
use veriscan_core::{
    CaptureOutcome, CardResult, CloudAddress, DriversLicenseFields, LicenseVerdict,
};

use crate::traits::{CaptureRequest, CaptureSurface, EngineRequest, LicenseService,
    RecognitionEngine};

/// Park/release switch shared by the stubs.
#[derive(Default)]
struct Turnstile {
    held: AtomicBool,
    release: Notify,
}

impl Turnstile {
    fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        // notify_one stores a permit, so a release racing the park still wins.
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
    }
}

/// A canned driver's-license result for tests that only care that *a*
/// result came back.
pub fn sample_license_result() -> CardResult {
    CardResult::DriversLicense(DriversLicenseFields {
        full_name: Some("JANE Q SAMPLE".into()),
        license_number: Some("S530-1234-5678".into()),
        state_or_province: Some("WA".into()),
        ..DriversLicenseFields::default()
    })
}

/// Scripted recognition engine.
#[derive(Default)]
pub struct StubEngine {
    requests: Mutex<Vec<EngineRequest>>,
    script: Mutex<VecDeque<Result<CardResult>>>,
    turnstile: Turnstile,
    never_complete: AtomicBool,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next call. Unscripted calls return
    /// [`sample_license_result`].
    pub fn push_outcome(&self, outcome: Result<CardResult>) {
        self.script
            .lock()
            .expect("engine script lock poisoned")
            .push_back(outcome);
    }

    /// Park the next call until [`release`](Self::release).
    pub fn hold(&self) {
        self.turnstile.hold();
    }

    pub fn release(&self) {
        self.turnstile.release();
    }

    /// Make every call hang forever (for timeout tests).
    pub fn never_complete(&self) {
        self.never_complete.store(true, Ordering::SeqCst);
    }

    /// Number of requests that reached the engine.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .expect("engine request lock poisoned")
            .len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests
            .lock()
            .expect("engine request lock poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl RecognitionEngine for StubEngine {
    async fn process_card(&self, request: EngineRequest) -> Result<CardResult> {
        tracing::debug!(card_type = ?request.card_type, "stub engine invoked");
        self.requests
            .lock()
            .expect("engine request lock poisoned")
            .push(request);
        if self.never_complete.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.turnstile.pass().await;
        self.script
            .lock()
            .expect("engine script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(sample_license_result()))
    }
}

/// Scripted license validation service: keys added via
/// [`accept_key`](Self::accept_key) validate, everything else is rejected.
#[derive(Default)]
pub struct StubLicenseService {
    valid_keys: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    turnstile: Turnstile,
    fail_reason: Mutex<Option<String>>,
}

impl StubLicenseService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service that validates the given key.
    pub fn accepting(key: &str) -> Self {
        let service = Self::default();
        service.accept_key(key);
        service
    }

    pub fn accept_key(&self, key: &str) {
        self.valid_keys
            .lock()
            .expect("license key set lock poisoned")
            .insert(key.to_owned());
    }

    /// Make the next call fail outright (transport-level failure, not a
    /// rejection verdict).
    pub fn fail_next(&self, reason: &str) {
        *self.fail_reason.lock().expect("fail reason lock poisoned") = Some(reason.to_owned());
    }

    pub fn hold(&self) {
        self.turnstile.hold();
    }

    pub fn release(&self) {
        self.turnstile.release();
    }

    /// Number of validation round trips issued.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LicenseService for StubLicenseService {
    async fn validate_key(&self, key: &str, endpoint: &CloudAddress) -> Result<LicenseVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%endpoint, "stub license service invoked");
        self.turnstile.pass().await;

        if let Some(reason) = self
            .fail_reason
            .lock()
            .expect("fail reason lock poisoned")
            .take()
        {
            return Err(VeriscanError::Engine(reason));
        }

        let known = self
            .valid_keys
            .lock()
            .expect("license key set lock poisoned")
            .contains(key);
        Ok(if known {
            LicenseVerdict::valid()
        } else {
            LicenseVerdict::rejected("unknown license key")
        })
    }
}

/// Scripted capture surface. Unscripted presentations resolve to
/// `BackPressed`.
#[derive(Default)]
pub struct StubSurface {
    requests: Mutex<Vec<CaptureRequest>>,
    script: Mutex<VecDeque<Result<CaptureOutcome>>>,
    turnstile: Turnstile,
}

impl StubSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface that resolves its next presentation to `outcome`.
    pub fn scripted(outcome: Result<CaptureOutcome>) -> Self {
        let surface = Self::default();
        surface.push_outcome(outcome);
        surface
    }

    pub fn push_outcome(&self, outcome: Result<CaptureOutcome>) {
        self.script
            .lock()
            .expect("surface script lock poisoned")
            .push_back(outcome);
    }

    pub fn hold(&self) {
        self.turnstile.hold();
    }

    pub fn release(&self) {
        self.turnstile.release();
    }

    /// Number of presentations that reached the surface (i.e. how many
    /// times the camera actually started).
    pub fn run_count(&self) -> usize {
        self.requests
            .lock()
            .expect("surface request lock poisoned")
            .len()
    }

    pub fn last_request(&self) -> Option<CaptureRequest> {
        self.requests
            .lock()
            .expect("surface request lock poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl CaptureSurface for StubSurface {
    async fn run(&self, request: CaptureRequest) -> Result<CaptureOutcome> {
        tracing::debug!(session = %request.session, barcode_side = request.barcode_side,
            "stub surface presented");
        self.requests
            .lock()
            .expect("surface request lock poisoned")
            .push(request);
        self.turnstile.pass().await;
        self.script
            .lock()
            .expect("surface script lock poisoned")
            .pop_front()
            .unwrap_or(Ok(CaptureOutcome::BackPressed))
    }
}
