// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Controller facade — the full imperative surface of the SDK, glued over
// the activation gate and the two coordinators. Constructed only by the
// session registry.

use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};

use veriscan_core::error::Result;
use veriscan_core::{
    CaptureConfig, CaptureObserver, CardImage, CardRegion, CardType, HudMessage, LicenseObserver,
    ProcessOptions, ProcessingObserver,
};
use veriscan_engine::{CaptureSurface, LicenseService, RecognitionEngine};
use veriscan_license::{ActivationGate, LicenseState, VerdictCache, WatcherSlot};
use veriscan_capture::CaptureCoordinator;
use veriscan_process::ProcessingCoordinator;

/// Relays license outcomes to a weakly-held capture observer.
struct CaptureLicenseWatcher {
    observer: Weak<dyn CaptureObserver>,
}

impl LicenseObserver for CaptureLicenseWatcher {
    fn license_validated(&self, validated: bool) {
        if let Some(observer) = self.observer.upgrade() {
            observer.license_validated(validated);
        }
    }
}

/// Relays license outcomes to a weakly-held processing observer.
struct ProcessingLicenseWatcher {
    observer: Weak<dyn ProcessingObserver>,
}

impl LicenseObserver for ProcessingLicenseWatcher {
    fn license_validated(&self, validated: bool) {
        if let Some(observer) = self.observer.upgrade() {
            observer.license_validated(validated);
        }
    }
}

/// The SDK controller.
///
/// One per registry. All methods are callable from any thread; long-running
/// work is offloaded and reported through the observers handed to
/// [`show_capture_interface`](Self::show_capture_interface) and
/// [`process`](Self::process).
pub struct CaptureController {
    gate: Arc<ActivationGate>,
    capture: CaptureCoordinator,
    processing: ProcessingCoordinator,
    config: Mutex<CaptureConfig>,
    surface: Mutex<Option<Arc<dyn CaptureSurface>>>,
}

impl CaptureController {
    pub(crate) fn new(
        engine: Arc<dyn RecognitionEngine>,
        license: Arc<dyn LicenseService>,
        cache: Option<VerdictCache>,
    ) -> Arc<Self> {
        let gate = Arc::new(ActivationGate::new(license, cache));
        Arc::new(Self {
            capture: CaptureCoordinator::new(Arc::clone(&gate)),
            processing: ProcessingCoordinator::new(Arc::clone(&gate), engine),
            gate,
            config: Mutex::new(CaptureConfig::default()),
            surface: Mutex::new(None),
        })
    }

    pub(crate) fn gate(&self) -> &Arc<ActivationGate> {
        &self.gate
    }

    // -- Licensing ------------------------------------------------------------

    /// Store the key without validating it.
    pub fn set_license_key(&self, key: &str) {
        self.gate.set_license_key(key);
    }

    /// Configure the validation endpoint. Fails without mutating state when
    /// the URL is malformed.
    pub fn set_cloud_address(&self, raw: &str) -> Result<()> {
        self.gate.set_cloud_address(raw)
    }

    /// Validate `key` in the background; the verdict reaches registered
    /// observers through their `license_validated` callback.
    pub fn activate_license_key(&self, key: &str) {
        self.gate.activate_license_key(key);
    }

    pub fn license_state(&self) -> LicenseState {
        self.gate.state()
    }

    pub fn is_license_validated(&self) -> bool {
        self.gate.is_validated()
    }

    // -- Capture configuration ------------------------------------------------

    /// Target crop width in pixels. Must be paired with a crop height by
    /// presentation time.
    pub fn set_crop_width(&self, width: Option<u32>) {
        self.config.lock().expect("config lock poisoned").crop_width = width;
    }

    /// Target crop height in pixels. Must be paired with a crop width by
    /// presentation time.
    pub fn set_crop_height(&self, height: Option<u32>) {
        self.config.lock().expect("config lock poisoned").crop_height = height;
    }

    /// Whether barcode-side frames are cropped too. Off by default.
    pub fn set_can_crop_barcode(&self, enabled: bool) {
        self.config
            .lock()
            .expect("config lock poisoned")
            .can_crop_barcode = enabled;
    }

    /// HUD message shown when the capture interface appears.
    pub fn set_initial_message(&self, message: Option<HudMessage>) {
        self.config
            .lock()
            .expect("config lock poisoned")
            .initial_message = message;
    }

    /// HUD message shown while a frame is being captured.
    pub fn set_capturing_message(&self, message: Option<HudMessage>) {
        self.config
            .lock()
            .expect("config lock poisoned")
            .capturing_message = message;
    }

    /// Snapshot of the current capture configuration.
    pub fn capture_config(&self) -> CaptureConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    // -- Capture surface ------------------------------------------------------

    /// Install the host capture surface (camera UI). Presenting without one
    /// fails with a configuration-error event.
    pub fn install_capture_surface(&self, surface: Arc<dyn CaptureSurface>) {
        *self.surface.lock().expect("surface lock poisoned") = Some(surface);
    }

    /// Remove the installed capture surface.
    pub fn remove_capture_surface(&self) {
        *self.surface.lock().expect("surface lock poisoned") = None;
    }

    // -- Capture flow ---------------------------------------------------------

    /// Present the capture interface and start the camera.
    ///
    /// `observer` is weakly held; it also becomes the controller's current
    /// license watcher for capture, so later license transitions reach its
    /// `license_validated` callback. Precondition failures arrive as
    /// `capture_failed` events.
    pub fn show_capture_interface(
        &self,
        observer: &Arc<dyn CaptureObserver>,
        card_type: CardType,
        region: CardRegion,
        barcode_side: bool,
    ) {
        self.gate.register_watcher(
            WatcherSlot::Capture,
            Arc::new(CaptureLicenseWatcher {
                observer: Arc::downgrade(observer),
            }),
        );
        let surface = self.surface.lock().expect("surface lock poisoned").clone();
        let config = self.capture_config();
        self.capture
            .present(surface, observer, card_type, region, barcode_side, config);
    }

    /// Tear down the capture interface without a terminal capture event.
    pub fn dismiss_capture_interface(&self) {
        self.capture.dismiss();
    }

    pub fn start_camera(&self) {
        self.capture.start_camera();
    }

    pub fn stop_camera(&self) {
        self.capture.stop_camera();
    }

    /// Current capture session phase, mostly useful to tests and debugging.
    pub fn capture_phase(&self) -> veriscan_capture::CapturePhase {
        self.capture.phase()
    }

    // -- Processing flow ------------------------------------------------------

    /// Submit card imagery for recognition. Single-flight; see
    /// [`ProcessingCoordinator::process`] for the drop semantics.
    pub fn process(
        &self,
        front: Option<CardImage>,
        back: Option<CardImage>,
        side_data: Option<String>,
        options: ProcessOptions,
        observer: &Arc<dyn ProcessingObserver>,
    ) {
        self.gate.register_watcher(
            WatcherSlot::Processing,
            Arc::new(ProcessingLicenseWatcher {
                observer: Arc::downgrade(observer),
            }),
        );
        self.processing
            .process(front, back, side_data, options, observer);
    }

    /// Phase of the current or most recent processing request.
    pub fn processing_phase(&self) -> veriscan_process::RequestPhase {
        self.processing.phase()
    }
}

/// Factory-flow watcher: forwards the verdict to the capture observer and,
/// on success, presents the capture interface exactly once.
pub(crate) struct PresentOnValidation {
    controller: Weak<CaptureController>,
    observer: Weak<dyn CaptureObserver>,
    card_type: CardType,
    region: CardRegion,
    barcode_side: bool,
    fired: Mutex<bool>,
}

impl PresentOnValidation {
    pub(crate) fn new(
        controller: &Arc<CaptureController>,
        observer: &Arc<dyn CaptureObserver>,
        card_type: CardType,
        region: CardRegion,
        barcode_side: bool,
    ) -> Self {
        Self {
            controller: Arc::downgrade(controller),
            observer: Arc::downgrade(observer),
            card_type,
            region,
            barcode_side,
            fired: Mutex::new(false),
        }
    }
}

impl LicenseObserver for PresentOnValidation {
    fn license_validated(&self, validated: bool) {
        if let Some(observer) = self.observer.upgrade() {
            observer.license_validated(validated);
        }
        if !validated {
            debug!("factory presentation skipped; key was rejected");
            return;
        }
        {
            let mut fired = self.fired.lock().expect("factory watcher lock poisoned");
            if *fired {
                return;
            }
            *fired = true;
        }
        let (Some(controller), Some(observer)) =
            (self.controller.upgrade(), self.observer.upgrade())
        else {
            warn!("controller or observer dropped before factory presentation");
            return;
        };
        controller.show_capture_interface(&observer, self.card_type, self.region, self.barcode_side);
    }
}
