// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing coordinator — hands captured card imagery to the recognition
// engine, one request at a time.
//
// Single-flight protocol: a request submitted while another is in flight is
// dropped silently (logged, never surfaced to the observer). Precondition
// failures are delivered to the observer as failure events and do not
// occupy the flight slot.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use veriscan_core::error::VeriscanError;
use veriscan_core::{CardImage, ProcessOptions, ProcessingObserver, RequestId};
use veriscan_engine::{EngineRequest, RecognitionEngine};
use veriscan_license::ActivationGate;

/// Where the current (or most recent) processing request stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// No request has been submitted yet.
    None,
    /// A request is with the engine. New submissions are dropped.
    InFlight,
    /// The last request produced a result.
    Completed,
    /// The last request failed.
    Failed,
}

impl RequestPhase {
    /// Any settled phase admits a new request.
    fn admits_new_request(self) -> bool {
        self != RequestPhase::InFlight
    }
}

/// Upper bound on a single engine round trip.
const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

/// Coordinator for engine-side card recognition.
pub struct ProcessingCoordinator {
    gate: Arc<ActivationGate>,
    engine: Arc<dyn RecognitionEngine>,
    phase: Arc<Mutex<RequestPhase>>,
    engine_timeout: Duration,
}

impl ProcessingCoordinator {
    pub fn new(gate: Arc<ActivationGate>, engine: Arc<dyn RecognitionEngine>) -> Self {
        Self {
            gate,
            engine,
            phase: Arc::new(Mutex::new(RequestPhase::None)),
            engine_timeout: Duration::from_secs(DEFAULT_ENGINE_TIMEOUT_SECS),
        }
    }

    /// Override the engine round-trip deadline.
    pub fn with_engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = timeout;
        self
    }

    /// Phase of the current or most recent request.
    pub fn phase(&self) -> RequestPhase {
        *self.phase.lock().expect("request phase lock poisoned")
    }

    /// Submit card imagery for recognition.
    ///
    /// Fire-and-forget: the result (or failure) reaches `observer`
    /// asynchronously. Preconditions are checked in order — license, front
    /// image, card type — and the first failure is delivered as a
    /// `processing_failed` event. A submission while another request is in
    /// flight is dropped without any observer event.
    #[instrument(skip_all, fields(card_type = ?options.card_type))]
    pub fn process(
        &self,
        front: Option<CardImage>,
        back: Option<CardImage>,
        side_data: Option<String>,
        options: ProcessOptions,
        observer: &Arc<dyn ProcessingObserver>,
    ) {
        // Single-flight comes first: a submission racing an in-flight
        // request has zero observable effect, even when it would also have
        // failed a precondition.
        {
            let phase = self.phase.lock().expect("request phase lock poisoned");
            if !phase.admits_new_request() {
                debug!("processing request already in flight; dropping submission");
                return;
            }
        }

        if let Err(e) = self.gate.require_validated() {
            Self::dispatch_failure(observer, e);
            return;
        }
        let front = match front {
            Some(image) if !image.is_empty() => image,
            _ => {
                Self::dispatch_failure(observer, VeriscanError::MissingFrontImage);
                return;
            }
        };
        let Some(card_type) = options.card_type else {
            Self::dispatch_failure(observer, VeriscanError::CardTypeNotSpecified);
            return;
        };

        // Claim the flight slot; losers are dropped silently.
        {
            let mut phase = self.phase.lock().expect("request phase lock poisoned");
            if !phase.admits_new_request() {
                debug!("processing request already in flight; dropping submission");
                return;
            }
            *phase = RequestPhase::InFlight;
        }

        let request_id = RequestId::new();
        info!(%request_id, "dispatching card to recognition engine");

        let request = EngineRequest {
            front,
            back,
            side_data,
            card_type,
            region: options.region,
        };
        let engine = Arc::clone(&self.engine);
        let phase = Arc::clone(&self.phase);
        let observer = Arc::downgrade(observer);
        let deadline = self.engine_timeout;
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(deadline, engine.process_card(request)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(VeriscanError::Timeout(deadline.as_secs())),
            };
            *phase.lock().expect("request phase lock poisoned") = match outcome {
                Ok(_) => RequestPhase::Completed,
                Err(_) => RequestPhase::Failed,
            };

            let Some(observer) = observer.upgrade() else {
                debug!(%request_id, "observer dropped before result; delivery skipped");
                return;
            };
            match outcome {
                Ok(result) => {
                    info!(%request_id, card_type = ?result.card_type(), "card processed");
                    observer.card_processed(result);
                }
                Err(e) => {
                    warn!(%request_id, "card processing failed: {e}");
                    observer.processing_failed(e);
                }
            }
        });
    }

    /// Deliver a precondition failure asynchronously, leaving the flight
    /// slot untouched.
    fn dispatch_failure(observer: &Arc<dyn ProcessingObserver>, error: VeriscanError) {
        warn!(%error, "processing request rejected");
        let weak: Weak<dyn ProcessingObserver> = Arc::downgrade(observer);
        tokio::spawn(async move {
            if let Some(observer) = weak.upgrade() {
                observer.processing_failed(error);
            }
        });
    }
}
