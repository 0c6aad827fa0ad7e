// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Activation gate — the license state machine.
//
// Exactly one gate exists per controller. Transitions are driven only from
// here: explicit key set, explicit activation, or a verdict arriving from
// the cache or the validation service. Activation is fire-and-forget; the
// outcome reaches the caller through registered license watchers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use tracing::{debug, info, instrument, warn};

use veriscan_core::error::{Result, VeriscanError};
use veriscan_core::{CloudAddress, LicenseObserver, LicenseVerdict};
use veriscan_engine::LicenseService;

use crate::cache::VerdictCache;

/// How long a cached verdict stays fresh before the network is consulted
/// again.
const DEFAULT_VERDICT_MAX_AGE_HOURS: i64 = 24;

/// The license lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseState {
    /// A key may be stored but has not been checked.
    Unvalidated,
    /// A validation round trip is in flight.
    Validating,
    /// The key was accepted.
    Validated(String),
    /// The key was rejected, with the service's reason.
    Rejected(String),
}

/// Named watcher registration slots.
///
/// The controller keeps at most one capture observer and one processing
/// observer current; registering into an occupied slot replaces it, so
/// watcher registrations never accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherSlot {
    Capture,
    Processing,
    /// Used by factory flows that present the capture interface once the
    /// key validates.
    Factory,
}

/// License activation gate.
pub struct ActivationGate {
    service: Arc<dyn LicenseService>,
    /// Verdict cache; `None` runs cache-less (every activation hits the
    /// network).
    cache: Option<Mutex<VerdictCache>>,
    key: Mutex<Option<String>>,
    endpoint: Mutex<Option<CloudAddress>>,
    state: Mutex<LicenseState>,
    /// Last state a notification was fired for, to suppress duplicates when
    /// an activation re-lands on an identical state.
    last_notified: Mutex<Option<LicenseState>>,
    watchers: Mutex<HashMap<WatcherSlot, Arc<dyn LicenseObserver>>>,
    verdict_max_age: Duration,
}

impl ActivationGate {
    pub fn new(service: Arc<dyn LicenseService>, cache: Option<VerdictCache>) -> Self {
        Self {
            service,
            cache: cache.map(Mutex::new),
            key: Mutex::new(None),
            endpoint: Mutex::new(None),
            state: Mutex::new(LicenseState::Unvalidated),
            last_notified: Mutex::new(None),
            watchers: Mutex::new(HashMap::new()),
            verdict_max_age: Duration::hours(DEFAULT_VERDICT_MAX_AGE_HOURS),
        }
    }

    /// Override the cached-verdict freshness window.
    pub fn with_verdict_max_age(mut self, max_age: Duration) -> Self {
        self.verdict_max_age = max_age;
        self
    }

    // -- Key and endpoint configuration --------------------------------------

    /// Store the license key without validating it. The state returns to
    /// `Unvalidated`; call [`activate_license_key`](Self::activate_license_key)
    /// to check the key.
    pub fn set_license_key(&self, key: &str) {
        *self.key.lock().expect("license key lock poisoned") = Some(key.to_owned());
        *self.state.lock().expect("license state lock poisoned") = LicenseState::Unvalidated;
        // The lifecycle restarts here, so the next verdict must notify even
        // when it lands on the same state as before.
        *self
            .last_notified
            .lock()
            .expect("last notified lock poisoned") = None;
        debug!("license key stored, state reset to unvalidated");
    }

    pub fn license_key(&self) -> Option<String> {
        self.key.lock().expect("license key lock poisoned").clone()
    }

    /// Configure the validation endpoint. Fails with a configuration error
    /// (and mutates nothing) when the URL is malformed.
    pub fn set_cloud_address(&self, raw: &str) -> Result<()> {
        let address = CloudAddress::parse(raw)?;
        info!(%address, "cloud address configured");
        *self.endpoint.lock().expect("endpoint lock poisoned") = Some(address);
        Ok(())
    }

    pub fn cloud_address(&self) -> Option<CloudAddress> {
        self.endpoint.lock().expect("endpoint lock poisoned").clone()
    }

    // -- State inspection -----------------------------------------------------

    pub fn state(&self) -> LicenseState {
        self.state.lock().expect("license state lock poisoned").clone()
    }

    pub fn is_validated(&self) -> bool {
        matches!(self.state(), LicenseState::Validated(_))
    }

    /// Fail fast unless the key has been validated.
    pub fn require_validated(&self) -> Result<()> {
        match self.state() {
            LicenseState::Validated(_) => Ok(()),
            LicenseState::Rejected(reason) => Err(VeriscanError::LicenseRejected(reason)),
            _ => Err(VeriscanError::NotLicensed),
        }
    }

    // -- Watchers -------------------------------------------------------------

    /// Register (or replace) the watcher for `slot`.
    pub fn register_watcher(&self, slot: WatcherSlot, watcher: Arc<dyn LicenseObserver>) {
        self.watchers
            .lock()
            .expect("watcher table lock poisoned")
            .insert(slot, watcher);
    }

    fn notify_watchers(&self, validated: bool) {
        // Snapshot so watcher callbacks may register further watchers
        // without deadlocking.
        let snapshot: Vec<Arc<dyn LicenseObserver>> = self
            .watchers
            .lock()
            .expect("watcher table lock poisoned")
            .values()
            .cloned()
            .collect();
        for watcher in snapshot {
            watcher.license_validated(validated);
        }
    }

    // -- Activation -----------------------------------------------------------

    /// Validate `key`, preferring a fresh cached verdict over a network
    /// round trip.
    ///
    /// Fire-and-forget: returns immediately, with the outcome delivered to
    /// registered watchers. Idempotent while `Validating` — a second call
    /// piggybacks on the in-flight check instead of issuing a duplicate
    /// round trip. The network path requires a Tokio runtime.
    #[instrument(skip_all)]
    pub fn activate_license_key(self: &Arc<Self>, key: &str) {
        {
            let mut state = self.state.lock().expect("license state lock poisoned");
            if matches!(*state, LicenseState::Validating) {
                debug!("activation already in flight; piggybacking");
                return;
            }
            *state = LicenseState::Validating;
        }
        *self.key.lock().expect("license key lock poisoned") = Some(key.to_owned());

        // Fast path: a fresh local verdict settles activation synchronously.
        if let Some(cache) = &self.cache {
            let cached = cache
                .lock()
                .expect("verdict cache lock poisoned")
                .lookup(key, self.verdict_max_age);
            match cached {
                Ok(Some(verdict)) => {
                    debug!(validated = verdict.validated, "cached verdict applied");
                    self.conclude(key, verdict, false);
                    return;
                }
                Ok(None) => {}
                Err(e) => warn!("verdict cache lookup failed: {e}"),
            }
        }

        let Some(endpoint) = self.endpoint.lock().expect("endpoint lock poisoned").clone()
        else {
            warn!("no cloud address configured; cannot validate license key");
            self.conclude(
                key,
                LicenseVerdict::rejected("cloud address not configured"),
                false,
            );
            return;
        };

        let gate = Arc::clone(self);
        let key = key.to_owned();
        tokio::spawn(async move {
            let verdict = match gate.service.validate_key(&key, &endpoint).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!("license validation call failed: {e}");
                    LicenseVerdict::rejected(e.to_string())
                }
            };
            gate.conclude(&key, verdict, true);
        });
    }

    /// Commit a verdict: update state, optionally persist to the cache, and
    /// notify watchers at most once per transition.
    fn conclude(&self, key: &str, verdict: LicenseVerdict, cache_it: bool) {
        if cache_it {
            if let Some(cache) = &self.cache {
                let stored = cache
                    .lock()
                    .expect("verdict cache lock poisoned")
                    .store(key, &verdict);
                if let Err(e) = stored {
                    warn!("failed to cache verdict: {e}");
                }
            }
        }

        let new_state = if verdict.validated {
            LicenseState::Validated(key.to_owned())
        } else {
            LicenseState::Rejected(
                verdict
                    .reason
                    .clone()
                    .unwrap_or_else(|| "license rejected".to_owned()),
            )
        };
        info!(validated = verdict.validated, "license state transition");
        *self.state.lock().expect("license state lock poisoned") = new_state.clone();

        {
            let mut last = self
                .last_notified
                .lock()
                .expect("last notified lock poisoned");
            if last.as_ref() == Some(&new_state) {
                debug!("suppressing duplicate license notification");
                return;
            }
            *last = Some(new_state);
        }
        self.notify_watchers(verdict.validated);
    }
}
