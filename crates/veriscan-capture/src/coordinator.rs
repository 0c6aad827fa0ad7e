// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture coordinator — owns the camera lifecycle and the capture session
// state machine.
//
//   Idle → Presenting → Capturing → Completed → Idle
//                     ↘ Cancelled → Idle   (back button)
//   any  → Idle with an error event        (surface failure)
//
// Exactly one terminal event (image, barcode, back press, or error) is
// delivered per session. `dismiss` is the caller-driven teardown: it emits
// the UI lifecycle callbacks but no terminal event. Sessions carry a
// generation number so a completion racing a dismissal is dropped instead
// of delivered twice.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use veriscan_core::error::{Result, VeriscanError};
use veriscan_core::{
    CaptureConfig, CaptureObserver, CaptureOutcome, CardRegion, CardType, SessionId,
};
use veriscan_engine::{CaptureRequest, CaptureSurface, SurfaceChrome};
use veriscan_license::ActivationGate;

use crate::crop::crop_to;

/// Phases of the capture session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    /// No surface presented.
    Idle,
    /// Surface presented, camera not yet running.
    Presenting,
    /// Camera running, waiting for a terminal outcome.
    Capturing,
    /// A terminal capture event was delivered.
    Completed,
    /// The user backed out of the session.
    Cancelled,
}

struct SessionInner {
    phase: CapturePhase,
    /// Bumped on every presentation and dismissal; stale completions are
    /// dropped by comparing against it.
    generation: u64,
    camera_running: bool,
    cancel: Option<oneshot::Sender<()>>,
    observer: Option<Weak<dyn CaptureObserver>>,
}

/// Coordinator for the camera-driven capture flow. One per controller; the
/// camera is an exclusive resource, so at most one session is live at a
/// time.
pub struct CaptureCoordinator {
    gate: Arc<ActivationGate>,
    inner: Arc<Mutex<SessionInner>>,
}

impl CaptureCoordinator {
    pub fn new(gate: Arc<ActivationGate>) -> Self {
        Self {
            gate,
            inner: Arc::new(Mutex::new(SessionInner {
                phase: CapturePhase::Idle,
                generation: 0,
                camera_running: false,
                cancel: None,
                observer: None,
            })),
        }
    }

    /// Current session phase.
    pub fn phase(&self) -> CapturePhase {
        self.inner.lock().expect("capture state lock poisoned").phase
    }

    /// Present the capture surface and start a session.
    ///
    /// Precondition failures (unvalidated license, missing host surface,
    /// unpaired crop dimensions) are delivered to the observer as failure
    /// events, never returned or thrown. A call while a session is already
    /// presenting or capturing returns immediately with no effect.
    pub fn present(
        &self,
        surface: Option<Arc<dyn CaptureSurface>>,
        observer: &Arc<dyn CaptureObserver>,
        card_type: CardType,
        region: CardRegion,
        barcode_side: bool,
        config: CaptureConfig,
    ) {
        {
            let inner = self.inner.lock().expect("capture state lock poisoned");
            if matches!(
                inner.phase,
                CapturePhase::Presenting | CapturePhase::Capturing
            ) {
                debug!("capture session already live; ignoring re-entrant present");
                return;
            }
        }

        if let Err(e) = self.gate.require_validated() {
            Self::dispatch_failure(observer, e);
            return;
        }
        let Some(surface) = surface else {
            Self::dispatch_failure(observer, VeriscanError::MissingCaptureSurface);
            return;
        };
        let crop = match config.crop_dimensions() {
            Ok(dims) => dims,
            Err(e) => {
                Self::dispatch_failure(observer, e);
                return;
            }
        };
        // Barcode-side frames are only cropped when explicitly enabled.
        let crop = if barcode_side && !config.can_crop_barcode {
            None
        } else {
            crop
        };

        let session = SessionId::new();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let generation = {
            let mut inner = self.inner.lock().expect("capture state lock poisoned");
            if matches!(
                inner.phase,
                CapturePhase::Presenting | CapturePhase::Capturing
            ) {
                // Lost a race against a concurrent present.
                return;
            }
            inner.generation += 1;
            inner.phase = CapturePhase::Presenting;
            inner.camera_running = false;
            inner.cancel = Some(cancel_tx);
            inner.observer = Some(Arc::downgrade(observer));
            inner.generation
        };

        info!(%session, ?card_type, ?region, barcode_side, "presenting capture interface");
        observer.interface_did_appear();

        // The camera starts automatically on presentation; a manual
        // start_camera call afterwards is a no-op.
        self.start_camera();

        let request = CaptureRequest {
            session,
            card_type,
            region,
            barcode_side,
            config,
            chrome: SurfaceChrome::from_observer(observer.as_ref()),
        };
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                outcome = surface.run(request) => {
                    Self::finish_session(&inner, generation, outcome, crop);
                }
                _ = cancel_rx => {
                    debug!(%session, "capture session dismissed before completion");
                }
            }
        });
    }

    /// Tear down the current session without a terminal capture event.
    ///
    /// Valid from any non-Idle phase: releases the camera, cancels the
    /// surface future, and emits only the UI lifecycle callbacks.
    pub fn dismiss(&self) {
        let observer = {
            let mut inner = self.inner.lock().expect("capture state lock poisoned");
            if inner.phase == CapturePhase::Idle {
                debug!("dismiss with no live session is a no-op");
                return;
            }
            if let Some(cancel) = inner.cancel.take() {
                let _ = cancel.send(());
            }
            inner.camera_running = false;
            inner.phase = CapturePhase::Idle;
            // Invalidate any completion racing this dismissal.
            inner.generation += 1;
            inner.observer.take()
        };

        info!("capture interface dismissed");
        if let Some(observer) = observer.and_then(|weak| weak.upgrade()) {
            observer.interface_will_disappear();
            observer.interface_did_disappear();
        }
    }

    /// Start the camera. No-op unless a surface is presented with the
    /// camera stopped; repeated calls in the same effective state do
    /// nothing.
    pub fn start_camera(&self) {
        let mut inner = self.inner.lock().expect("capture state lock poisoned");
        match inner.phase {
            CapturePhase::Presenting if !inner.camera_running => {
                inner.camera_running = true;
                inner.phase = CapturePhase::Capturing;
                debug!("camera started");
            }
            CapturePhase::Capturing => {
                debug!("camera already running; start_camera is a no-op");
            }
            _ => {
                debug!(phase = ?inner.phase, "start_camera outside a session is a no-op");
            }
        }
    }

    /// Stop the camera without tearing down the surface. No-op when the
    /// camera is not running.
    pub fn stop_camera(&self) {
        let mut inner = self.inner.lock().expect("capture state lock poisoned");
        if inner.phase == CapturePhase::Capturing && inner.camera_running {
            inner.camera_running = false;
            inner.phase = CapturePhase::Presenting;
            debug!("camera stopped");
        } else {
            debug!(phase = ?inner.phase, "camera already stopped; stop_camera is a no-op");
        }
    }

    /// Deliver a precondition failure without running a session. Dispatched
    /// asynchronously so the calling thread never re-enters the observer.
    fn dispatch_failure(observer: &Arc<dyn CaptureObserver>, error: VeriscanError) {
        warn!(%error, "capture request rejected");
        let weak = Arc::downgrade(observer);
        tokio::spawn(async move {
            if let Some(observer) = weak.upgrade() {
                observer.capture_failed(error);
            }
        });
    }

    /// Commit the terminal state for a session, then deliver its single
    /// terminal event. State mutations land before the callback runs, so an
    /// observer reading coordinator state inside the callback sees the
    /// post-transition phase.
    fn finish_session(
        inner: &Arc<Mutex<SessionInner>>,
        generation: u64,
        outcome: Result<CaptureOutcome>,
        crop: Option<(u32, u32)>,
    ) {
        // Resolve the crop before the terminal phase is decided, so a frame
        // that cannot be cropped settles as a failure rather than a success
        // carrying an error event.
        let outcome = match outcome {
            Ok(CaptureOutcome::Image { image, back_side }) => {
                let image = match crop {
                    Some((width, height)) => match crop_to(&image, width, height) {
                        Ok(cropped) => cropped,
                        Err(e) => {
                            warn!("crop failed; surfacing as capture error: {e}");
                            Self::finish_session_resolved(inner, generation, Err(e));
                            return;
                        }
                    },
                    None => image,
                };
                Ok(CaptureOutcome::Image { image, back_side })
            }
            other => other,
        };
        Self::finish_session_resolved(inner, generation, outcome);
    }

    fn finish_session_resolved(
        inner: &Arc<Mutex<SessionInner>>,
        generation: u64,
        outcome: Result<CaptureOutcome>,
    ) {
        let observer = {
            let mut inner = inner.lock().expect("capture state lock poisoned");
            if inner.generation != generation || inner.phase == CapturePhase::Idle {
                debug!("dropping stale capture outcome");
                return;
            }
            inner.phase = match outcome {
                Ok(CaptureOutcome::BackPressed) => CapturePhase::Cancelled,
                Ok(_) => CapturePhase::Completed,
                Err(_) => CapturePhase::Idle,
            };
            inner.camera_running = false;
            inner.cancel = None;
            inner.observer.take()
        };

        let Some(observer) = observer.and_then(|weak| weak.upgrade()) else {
            debug!("observer dropped before terminal event; delivery skipped");
            return;
        };

        match outcome {
            Ok(CaptureOutcome::Image { image, back_side }) => {
                info!(back_side, bytes = image.len(), "card image captured");
                observer.image_captured(image, back_side);
            }
            Ok(CaptureOutcome::Barcode(data)) => {
                info!(bytes = data.len(), "barcode captured");
                observer.barcode_captured(data);
            }
            Ok(CaptureOutcome::BackPressed) => {
                info!("capture cancelled via back button");
                observer.back_pressed();
            }
            Err(e) => {
                warn!("capture session failed: {e}");
                observer.capture_failed(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::time::Duration;

    use image::{DynamicImage, ImageFormat, RgbaImage};
    use tokio::sync::Notify;
    use tokio::time::timeout;

    use veriscan_core::{CardImage, LicenseVerdict};
    use veriscan_engine::stub::{StubLicenseService, StubSurface};
    use veriscan_license::VerdictCache;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Image { data: Vec<u8>, back_side: bool },
        Barcode(String),
        Failed(String),
        BackPressed,
        Appeared,
        WillDisappear,
        DidDisappear,
    }

    impl Event {
        fn is_terminal(&self) -> bool {
            matches!(
                self,
                Event::Image { .. } | Event::Barcode(_) | Event::Failed(_) | Event::BackPressed
            )
        }
    }

    #[derive(Default)]
    struct TestObserver {
        events: Mutex<Vec<Event>>,
        bell: Notify,
    }

    impl TestObserver {
        fn record(&self, event: Event) {
            self.events.lock().unwrap().push(event);
            self.bell.notify_one();
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn terminal_events(&self) -> Vec<Event> {
            self.events()
                .into_iter()
                .filter(Event::is_terminal)
                .collect()
        }

        async fn wait_for_terminal(&self) {
            timeout(Duration::from_secs(1), async {
                loop {
                    if !self.terminal_events().is_empty() {
                        return;
                    }
                    self.bell.notified().await;
                }
            })
            .await
            .expect("no terminal capture event arrived");
        }
    }

    impl CaptureObserver for TestObserver {
        fn image_captured(&self, image: CardImage, back_side: bool) {
            self.record(Event::Image {
                data: image.data,
                back_side,
            });
        }

        fn barcode_captured(&self, data: String) {
            self.record(Event::Barcode(data));
        }

        fn capture_failed(&self, error: VeriscanError) {
            self.record(Event::Failed(error.to_string()));
        }

        fn back_pressed(&self) {
            self.record(Event::BackPressed);
        }

        fn interface_did_appear(&self) {
            self.record(Event::Appeared);
        }

        fn interface_will_disappear(&self) {
            self.record(Event::WillDisappear);
        }

        fn interface_did_disappear(&self) {
            self.record(Event::DidDisappear);
        }
    }

    fn validated_gate() -> Arc<ActivationGate> {
        let cache = VerdictCache::open_in_memory().unwrap();
        cache.store("TEST-KEY", &LicenseVerdict::valid()).unwrap();
        let gate = Arc::new(ActivationGate::new(
            Arc::new(StubLicenseService::new()),
            Some(cache),
        ));
        gate.activate_license_key("TEST-KEY");
        gate
    }

    fn unvalidated_gate() -> Arc<ActivationGate> {
        Arc::new(ActivationGate::new(Arc::new(StubLicenseService::new()), None))
    }

    fn png_image(width: u32, height: u32) -> CardImage {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([10, 20, 30, 255]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        CardImage::new(buffer.into_inner())
    }

    fn present_with(
        coordinator: &CaptureCoordinator,
        surface: &Arc<StubSurface>,
        observer: &Arc<TestObserver>,
        barcode_side: bool,
        config: CaptureConfig,
    ) {
        coordinator.present(
            Some(surface.clone() as Arc<dyn CaptureSurface>),
            &(observer.clone() as Arc<dyn CaptureObserver>),
            CardType::DriversLicense,
            CardRegion::UnitedStates,
            barcode_side,
            config,
        );
    }

    #[tokio::test]
    async fn unlicensed_present_fails_without_starting_camera() {
        let coordinator = CaptureCoordinator::new(unvalidated_gate());
        let surface = Arc::new(StubSurface::new());
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        observer.wait_for_terminal().await;

        let terminals = observer.terminal_events();
        assert_eq!(terminals.len(), 1);
        assert!(matches!(&terminals[0], Event::Failed(msg)
            if msg.contains("license key has not been validated")));
        assert_eq!(surface.run_count(), 0);
        assert_eq!(coordinator.phase(), CapturePhase::Idle);
    }

    #[tokio::test]
    async fn missing_surface_is_a_configuration_error() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let observer = Arc::new(TestObserver::default());

        coordinator.present(
            None,
            &(observer.clone() as Arc<dyn CaptureObserver>),
            CardType::Passport,
            CardRegion::Europe,
            false,
            CaptureConfig::default(),
        );
        observer.wait_for_terminal().await;

        assert!(matches!(&observer.terminal_events()[0], Event::Failed(msg)
            if msg.contains("capture surface")));
    }

    #[tokio::test]
    async fn unpaired_crop_dimensions_are_rejected() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::new());
        let observer = Arc::new(TestObserver::default());
        let config = CaptureConfig {
            crop_width: Some(1009),
            ..CaptureConfig::default()
        };

        present_with(&coordinator, &surface, &observer, false, config);
        observer.wait_for_terminal().await;

        assert!(matches!(&observer.terminal_events()[0], Event::Failed(msg)
            if msg.contains("crop width and crop height")));
        assert_eq!(surface.run_count(), 0);
    }

    #[tokio::test]
    async fn image_capture_delivers_exactly_one_terminal_event() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Image {
            image: png_image(50, 30),
            back_side: true,
        })));
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        observer.wait_for_terminal().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let terminals = observer.terminal_events();
        assert_eq!(terminals.len(), 1);
        assert!(matches!(&terminals[0], Event::Image { back_side: true, .. }));
        assert_eq!(observer.events()[0], Event::Appeared);
        assert_eq!(coordinator.phase(), CapturePhase::Completed);
    }

    #[tokio::test]
    async fn barcode_capture_delivers_data() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Barcode(
            "ANSI 636000090002".into(),
        ))));
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, true, CaptureConfig::default());
        observer.wait_for_terminal().await;

        assert_eq!(
            observer.terminal_events(),
            vec![Event::Barcode("ANSI 636000090002".into())]
        );
    }

    #[tokio::test]
    async fn back_press_cancels_the_session() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::new()); // unscripted → BackPressed
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        observer.wait_for_terminal().await;

        assert_eq!(observer.terminal_events(), vec![Event::BackPressed]);
        assert_eq!(coordinator.phase(), CapturePhase::Cancelled);
    }

    #[tokio::test]
    async fn reentrant_present_has_no_effect() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::new());
        surface.hold();
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(surface.run_count(), 1);
        let appeared = observer
            .events()
            .iter()
            .filter(|e| **e == Event::Appeared)
            .count();
        assert_eq!(appeared, 1);

        coordinator.dismiss();
    }

    #[tokio::test]
    async fn dismiss_before_terminal_emits_no_capture_event() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Image {
            image: png_image(50, 30),
            back_side: false,
        })));
        surface.hold();
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        coordinator.dismiss();
        surface.release();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(observer.terminal_events().is_empty());
        assert!(observer.events().contains(&Event::WillDisappear));
        assert!(observer.events().contains(&Event::DidDisappear));
        assert_eq!(coordinator.phase(), CapturePhase::Idle);
    }

    #[tokio::test]
    async fn start_camera_is_idempotent() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::new());
        surface.hold();
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        assert_eq!(coordinator.phase(), CapturePhase::Capturing);

        coordinator.start_camera();
        assert_eq!(coordinator.phase(), CapturePhase::Capturing);

        coordinator.stop_camera();
        assert_eq!(coordinator.phase(), CapturePhase::Presenting);
        coordinator.stop_camera();
        assert_eq!(coordinator.phase(), CapturePhase::Presenting);

        coordinator.start_camera();
        assert_eq!(coordinator.phase(), CapturePhase::Capturing);

        coordinator.dismiss();
    }

    #[tokio::test]
    async fn paired_crop_dimensions_are_applied() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Image {
            image: png_image(100, 80),
            back_side: false,
        })));
        let observer = Arc::new(TestObserver::default());
        let config = CaptureConfig {
            crop_width: Some(40),
            crop_height: Some(20),
            ..CaptureConfig::default()
        };

        present_with(&coordinator, &surface, &observer, false, config);
        observer.wait_for_terminal().await;

        let Event::Image { data, .. } = observer.terminal_events()[0].clone() else {
            panic!("expected an image event");
        };
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }

    #[tokio::test]
    async fn crop_failure_settles_the_session_as_failed() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Image {
            image: CardImage::new(vec![0x00, 0x01, 0x02, 0x03]),
            back_side: false,
        })));
        let observer = Arc::new(TestObserver::default());
        let config = CaptureConfig {
            crop_width: Some(40),
            crop_height: Some(20),
            ..CaptureConfig::default()
        };

        present_with(&coordinator, &surface, &observer, false, config);
        observer.wait_for_terminal().await;

        let terminals = observer.terminal_events();
        assert_eq!(terminals.len(), 1);
        assert!(matches!(&terminals[0], Event::Failed(msg)
            if msg.contains("image processing failed")));
        assert_eq!(coordinator.phase(), CapturePhase::Idle);
    }

    #[tokio::test]
    async fn barcode_side_crop_requires_opt_in() {
        // can_crop_barcode defaults to false: the frame passes through.
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Image {
            image: png_image(100, 80),
            back_side: true,
        })));
        let observer = Arc::new(TestObserver::default());
        let config = CaptureConfig {
            crop_width: Some(40),
            crop_height: Some(20),
            ..CaptureConfig::default()
        };

        present_with(&coordinator, &surface, &observer, true, config);
        observer.wait_for_terminal().await;

        let Event::Image { data, .. } = observer.terminal_events()[0].clone() else {
            panic!("expected an image event");
        };
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 80));
    }

    struct BrandedObserver;

    impl CaptureObserver for BrandedObserver {
        fn image_captured(&self, _image: CardImage, _back_side: bool) {}

        fn barcode_captured(&self, _data: String) {}

        fn capture_failed(&self, _error: VeriscanError) {}

        fn watermark_text(&self) -> Option<String> {
            Some("ACME BANK".into())
        }

        fn show_flash_button(&self) -> bool {
            false
        }

        fn barcode_error_message(&self) -> Option<String> {
            Some("Try tilting the card".into())
        }

        fn barcode_error_delay_secs(&self) -> u32 {
            5
        }
    }

    #[tokio::test]
    async fn observer_chrome_choices_reach_the_surface() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::new());
        surface.hold();
        let observer = Arc::new(BrandedObserver);

        coordinator.present(
            Some(surface.clone() as Arc<dyn CaptureSurface>),
            &(observer.clone() as Arc<dyn CaptureObserver>),
            CardType::DriversLicense,
            CardRegion::UnitedStates,
            true,
            CaptureConfig::default(),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        let request = surface.last_request().expect("surface saw no request");
        assert_eq!(
            request.chrome,
            veriscan_engine::SurfaceChrome {
                watermark_text: Some("ACME BANK".into()),
                show_back_button: true,
                show_flash_button: false,
                barcode_error_message: Some("Try tilting the card".into()),
                barcode_error_delay_secs: 5,
            }
        );

        coordinator.dismiss();
        surface.release();
    }

    #[tokio::test]
    async fn surface_failure_returns_to_idle_with_error() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Err(VeriscanError::Engine(
            "camera permission denied".into(),
        ))));
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        observer.wait_for_terminal().await;

        assert!(matches!(&observer.terminal_events()[0], Event::Failed(msg)
            if msg.contains("camera permission denied")));
        assert_eq!(coordinator.phase(), CapturePhase::Idle);
    }

    #[tokio::test]
    async fn delivery_to_dropped_observer_is_a_noop() {
        let coordinator = CaptureCoordinator::new(validated_gate());
        let surface = Arc::new(StubSurface::scripted(Ok(CaptureOutcome::Image {
            image: png_image(50, 30),
            back_side: false,
        })));
        surface.hold();
        let observer = Arc::new(TestObserver::default());

        present_with(&coordinator, &surface, &observer, false, CaptureConfig::default());
        drop(observer);
        surface.release();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The session still reaches its terminal phase; delivery was skipped.
        assert_eq!(coordinator.phase(), CapturePhase::Completed);
    }
}
