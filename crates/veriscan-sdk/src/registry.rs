// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session registry — the only way to obtain a controller.
//
// One controller exists per registry at a time. The registry is an explicit
// context object rather than a process-global, so tests hold their own
// isolated registries and `reset` gives a clean slate.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use veriscan_core::{CaptureObserver, CardRegion, CardType, LicenseObserver};
use veriscan_engine::{LicenseService, RecognitionEngine};
use veriscan_license::{VerdictCache, WatcherSlot};

use crate::controller::{CaptureController, PresentOnValidation};

/// The pluggable backends a registry builds controllers over.
pub struct Backends {
    pub engine: Arc<dyn RecognitionEngine>,
    pub license: Arc<dyn LicenseService>,
    /// On-disk verdict cache location. `None` keeps verdicts in memory for
    /// the life of the process.
    pub verdict_cache_path: Option<PathBuf>,
}

/// Controlled construction point for [`CaptureController`].
pub struct SessionRegistry {
    backends: Backends,
    controller: Mutex<Option<Arc<CaptureController>>>,
}

impl SessionRegistry {
    pub fn new(backends: Backends) -> Self {
        Self {
            backends,
            controller: Mutex::new(None),
        }
    }

    /// The singleton controller, constructing it on first use. Activates
    /// the previously stored key, if any; a brand-new controller starts
    /// unvalidated.
    pub fn get_or_create(&self) -> Arc<CaptureController> {
        let controller = self.obtain();
        if let Some(key) = controller.gate().license_key() {
            controller.activate_license_key(&key);
        }
        controller
    }

    /// The singleton controller, with `key` stored and activation kicked
    /// off in the background. An empty key is ignored.
    pub fn get_or_create_with_key(&self, key: &str) -> Arc<CaptureController> {
        let controller = self.obtain();
        if key.is_empty() {
            debug!("empty license key supplied; skipping activation");
        } else {
            controller.activate_license_key(key);
        }
        controller
    }

    /// As [`get_or_create_with_key`](Self::get_or_create_with_key), with the
    /// validation endpoint configured first. A malformed address is logged
    /// and ignored; construction never fails.
    pub fn get_or_create_with_key_and_address(
        &self,
        key: &str,
        cloud_address: &str,
    ) -> Arc<CaptureController> {
        let controller = self.obtain();
        if !cloud_address.is_empty() {
            if let Err(e) = controller.set_cloud_address(cloud_address) {
                warn!("ignoring malformed cloud address: {e}");
            }
        }
        if key.is_empty() {
            debug!("empty license key supplied; skipping activation");
        } else {
            controller.activate_license_key(key);
        }
        controller
    }

    /// The singleton controller, activating `key` and presenting the
    /// capture interface once — and only if — the key validates. The
    /// verdict also reaches `observer` through `license_validated`.
    pub fn get_or_create_and_present(
        &self,
        key: &str,
        observer: &Arc<dyn CaptureObserver>,
        card_type: CardType,
        region: CardRegion,
        barcode_side: bool,
    ) -> Arc<CaptureController> {
        let controller = self.obtain();
        let watcher = Arc::new(PresentOnValidation::new(
            &controller,
            observer,
            card_type,
            region,
            barcode_side,
        ));
        // A key validated earlier in the process produces no fresh
        // notification, so present straight away instead of waiting for one.
        if controller.is_license_validated() {
            debug!("license already validated; presenting immediately");
            watcher.license_validated(true);
            return controller;
        }
        controller.gate().register_watcher(WatcherSlot::Factory, watcher);
        if key.is_empty() {
            debug!("empty license key supplied; skipping activation");
        } else {
            controller.activate_license_key(key);
        }
        controller
    }

    /// Drop the controller so the next factory call builds a fresh one.
    pub fn reset(&self) {
        *self
            .controller
            .lock()
            .expect("registry controller lock poisoned") = None;
        info!("session registry reset");
    }

    fn obtain(&self) -> Arc<CaptureController> {
        let mut slot = self
            .controller
            .lock()
            .expect("registry controller lock poisoned");
        if let Some(controller) = slot.as_ref() {
            return Arc::clone(controller);
        }
        info!("constructing controller");
        let controller = CaptureController::new(
            Arc::clone(&self.backends.engine),
            Arc::clone(&self.backends.license),
            self.open_cache(),
        );
        *slot = Some(Arc::clone(&controller));
        controller
    }

    /// Open the verdict cache, degrading in steps: configured path, then
    /// in-memory, then cache-less. Controller construction never fails on
    /// storage trouble.
    fn open_cache(&self) -> Option<VerdictCache> {
        if let Some(path) = &self.backends.verdict_cache_path {
            match VerdictCache::open(path) {
                Ok(cache) => return Some(cache),
                Err(e) => {
                    warn!(path = %path.display(), "verdict cache unavailable, falling back: {e}");
                }
            }
        }
        match VerdictCache::open_in_memory() {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("running without a verdict cache: {e}");
                None
            }
        }
    }
}
