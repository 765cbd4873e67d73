//! Payment session state machine
//!
//! One session confirms one invoice payment: it creates the gateway intent,
//! hands the caller the redirect URL, then reconciles completion by polling
//! the status endpoint through its poll controller until a terminal outcome
//! or the attempt budget runs out.
//!
//! Concurrency discipline:
//! - at most one outstanding status check; ticks that find one in flight
//!   are skipped, manual checks return the current snapshot instead,
//! - every issued check is stamped with the session generation and applied
//!   only if the generation is unchanged, so results arriving after a
//!   dispose or restart are discarded,
//! - the timer is stopped synchronously inside every transition out of
//!   `Polling`, before observers are notified.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::services::poll_controller::PollController;
use crate::domain::{
    CreatePaymentRequest, FailureReason, GatewayStatus, PaymentIntent, PaymentProvider,
    SessionSnapshot, SessionState,
};
use crate::infrastructure::adapters::{ArtifactSource, GatewayApi};
use crate::shared::error::{AppError, AppResult, CheckError};
use crate::shared::metrics::MetricsUtils;

/// Per-session construction parameters
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub invoice_id: String,
    pub amount: f64,
    pub currency: String,
    pub provider: PaymentProvider,
    pub return_url: String,
    pub cancel_url: String,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub fetch_artifacts: bool,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    /// Bumped on every transition out of `Polling`, on restart, and on
    /// disposal; in-flight checks carry the value they were issued under.
    generation: u64,
    /// Generation of the one outstanding status check, if any
    in_flight_check: Option<u64>,
    initiation_in_flight: bool,
    artifact_fetch_started: bool,
    artifact_warning: Option<String>,
    disposed: bool,
    updated_at: DateTime<Utc>,
}

enum AfterCheck {
    KeepPolling,
    Done,
    FetchArtifacts,
}

#[derive(Clone, Copy)]
enum CheckOrigin {
    Tick,
    Manual,
}

impl CheckOrigin {
    fn as_str(&self) -> &'static str {
        match self {
            CheckOrigin::Tick => "tick",
            CheckOrigin::Manual => "manual",
        }
    }
}

/// State machine confirming one invoice payment
pub struct PaymentSession {
    session_id: String,
    invoice_id: String,
    amount: f64,
    currency: String,
    provider: PaymentProvider,
    return_url: String,
    cancel_url: String,
    fetch_artifacts: bool,
    created_at: DateTime<Utc>,
    gateway: Arc<dyn GatewayApi>,
    artifacts: Arc<dyn ArtifactSource>,
    metrics: Arc<MetricsUtils>,
    poll: PollController,
    inner: Mutex<SessionInner>,
    watch_tx: watch::Sender<SessionSnapshot>,
}

impl std::fmt::Debug for PaymentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSession")
            .field("session_id", &self.session_id)
            .field("invoice_id", &self.invoice_id)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("provider", &self.provider)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl PaymentSession {
    pub fn new(
        params: SessionParams,
        gateway: Arc<dyn GatewayApi>,
        artifacts: Arc<dyn ArtifactSource>,
        metrics: Arc<MetricsUtils>,
    ) -> Arc<Self> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let initial = SessionSnapshot {
            session_id: session_id.clone(),
            invoice_id: params.invoice_id.clone(),
            provider: params.provider,
            amount: params.amount,
            currency: params.currency.clone(),
            state: SessionState::Init.phase(),
            payment_url: None,
            provider_payment_id: None,
            attempts_used: 0,
            max_attempts: params.max_attempts,
            last_error: None,
            artifacts: Vec::new(),
            artifact_warning: None,
            disposed: false,
            created_at: now,
            updated_at: now,
        };
        let (watch_tx, _) = watch::channel(initial);

        Arc::new(Self {
            session_id,
            invoice_id: params.invoice_id,
            amount: params.amount,
            currency: params.currency,
            provider: params.provider,
            return_url: params.return_url,
            cancel_url: params.cancel_url,
            fetch_artifacts: params.fetch_artifacts,
            created_at: now,
            gateway,
            artifacts,
            metrics,
            poll: PollController::new(params.poll_interval, params.max_attempts),
            inner: Mutex::new(SessionInner {
                state: SessionState::Init,
                generation: 0,
                in_flight_check: None,
                initiation_in_flight: false,
                artifact_fetch_started: false,
                artifact_warning: None,
                disposed: false,
                updated_at: now,
            }),
            watch_tx,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }

    /// Current point-in-time projection of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock_inner();
        self.snapshot_from(&inner)
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.lock_inner().disposed
    }

    /// Whether the recurring timer is live (test and health introspection)
    pub fn timer_active(&self) -> bool {
        self.poll.is_running()
    }

    /// Create the payment intent at the gateway.
    ///
    /// On success the session holds the redirect URL and waits for the
    /// caller to send the user there. On failure the session is `Failed`
    /// and requires an explicit `restart()`; initiation is never retried
    /// automatically.
    pub async fn initiate(self: &Arc<Self>) -> AppResult<PaymentIntent> {
        {
            let mut inner = self.lock_inner();
            if inner.disposed {
                return Err(AppError::SessionDisposed);
            }
            match inner.state {
                SessionState::Init => {}
                ref state => {
                    return Err(AppError::InvalidTransition {
                        operation: "initiate",
                        state: state.phase().as_str(),
                    })
                }
            }
            if inner.initiation_in_flight {
                return Err(AppError::InvalidTransition {
                    operation: "initiate",
                    state: "init",
                });
            }
            inner.initiation_in_flight = true;
        }

        let request = CreatePaymentRequest {
            invoice_id: self.invoice_id.clone(),
            provider: self.provider,
            return_url: self.return_url.clone(),
            cancel_url: self.cancel_url.clone(),
        };
        let result = self.gateway.create_payment(request).await;

        let mut inner = self.lock_inner();
        inner.initiation_in_flight = false;
        if inner.disposed {
            return Err(AppError::SessionDisposed);
        }

        match result {
            Ok(intent) => {
                self.metrics.record_initiation(true);
                info!(
                    invoice_id = %self.invoice_id,
                    provider = self.provider.as_str(),
                    provider_payment_id = %intent.provider_payment_id,
                    "payment intent created, awaiting redirect"
                );
                inner.state = SessionState::AwaitingRedirect {
                    intent: intent.clone(),
                };
                self.touch_and_notify(&mut inner);
                Ok(intent)
            }
            Err(err) => {
                self.metrics.record_initiation(false);
                warn!(
                    invoice_id = %self.invoice_id,
                    error = %err,
                    "payment initiation failed"
                );
                inner.state = SessionState::Failed {
                    intent: None,
                    reason: err.clone().into(),
                };
                self.touch_and_notify(&mut inner);
                Err(AppError::Initiation(err))
            }
        }
    }

    /// Move to `Polling` and start the recurring status checks.
    ///
    /// Idempotent while already polling; invalid from any other state than
    /// `AwaitingRedirect`.
    pub fn start_polling(self: &Arc<Self>) -> AppResult<()> {
        {
            let mut inner = self.lock_inner();
            if inner.disposed {
                return Err(AppError::SessionDisposed);
            }
            match &inner.state {
                SessionState::Polling { .. } => return Ok(()),
                SessionState::AwaitingRedirect { intent } => {
                    let intent = intent.clone();
                    inner.state = SessionState::Polling { intent };
                }
                state => {
                    return Err(AppError::InvalidTransition {
                        operation: "start_polling",
                        state: state.phase().as_str(),
                    })
                }
            }
            self.touch_and_notify(&mut inner);
        }

        let weak = Arc::downgrade(self);
        self.poll.start(move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(session) => session.run_check(CheckOrigin::Tick).await,
                    None => false,
                }
            }
        });
        info!(
            invoice_id = %self.invoice_id,
            interval_ms = self.poll.interval().as_millis() as u64,
            max_attempts = self.poll.max_attempts(),
            "status polling started"
        );
        Ok(())
    }

    /// Check the gateway immediately, without waiting for the next
    /// scheduled tick and without disturbing the timer.
    ///
    /// If a check is already outstanding the current snapshot is returned
    /// instead of issuing a second call.
    pub async fn check_now(self: &Arc<Self>) -> AppResult<SessionSnapshot> {
        {
            let inner = self.lock_inner();
            if inner.disposed {
                return Err(AppError::SessionDisposed);
            }
            if !matches!(inner.state, SessionState::Polling { .. }) {
                return Err(AppError::InvalidTransition {
                    operation: "check_now",
                    state: inner.state.phase().as_str(),
                });
            }
        }

        self.run_check(CheckOrigin::Manual).await;
        Ok(self.snapshot())
    }

    /// Reset a failed session back to `Init`.
    ///
    /// Clears the attempt counter, the recorded failure, and the stored
    /// intent; a brand-new `initiate()` is required afterwards.
    pub fn restart(&self) -> AppResult<SessionSnapshot> {
        let mut inner = self.lock_inner();
        if inner.disposed {
            return Err(AppError::SessionDisposed);
        }
        match inner.state {
            SessionState::Failed { .. } => {}
            ref state => {
                return Err(AppError::InvalidTransition {
                    operation: "restart",
                    state: state.phase().as_str(),
                })
            }
        }

        self.poll.reset();
        inner.state = SessionState::Init;
        inner.generation += 1;
        inner.in_flight_check = None;
        inner.artifact_fetch_started = false;
        inner.artifact_warning = None;
        info!(invoice_id = %self.invoice_id, "payment session restarted");
        self.touch_and_notify(&mut inner);
        Ok(self.snapshot_from(&inner))
    }

    /// Release the session: stop the timer synchronously, invalidate any
    /// in-flight check, and refuse all further transitions.
    pub fn dispose(&self) {
        let mut inner = self.lock_inner();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        self.poll.stop();
        inner.generation += 1;
        info!(
            invoice_id = %self.invoice_id,
            state = inner.state.phase().as_str(),
            "payment session disposed"
        );
        self.touch_and_notify(&mut inner);
    }

    /// Perform one guarded status check and apply its outcome.
    ///
    /// Returns whether the poll timer should keep running.
    async fn run_check(self: &Arc<Self>, origin: CheckOrigin) -> bool {
        let issued_generation = {
            let mut inner = self.lock_inner();
            if inner.disposed || !matches!(inner.state, SessionState::Polling { .. }) {
                return false;
            }
            if inner.in_flight_check.is_some() {
                // one outstanding check at a time; overlapping ticks are
                // skipped, not queued
                debug!(
                    invoice_id = %self.invoice_id,
                    origin = origin.as_str(),
                    "status check already in flight, skipping"
                );
                return true;
            }
            inner.in_flight_check = Some(inner.generation);
            inner.generation
        };

        let result = self.gateway.check_status(&self.invoice_id).await;

        let action = {
            let mut inner = self.lock_inner();
            if inner.in_flight_check == Some(issued_generation) {
                inner.in_flight_check = None;
            }
            let intent = match &inner.state {
                SessionState::Polling { intent }
                    if !inner.disposed && inner.generation == issued_generation =>
                {
                    intent.clone()
                }
                _ => {
                    debug!(
                        invoice_id = %self.invoice_id,
                        origin = origin.as_str(),
                        generation = issued_generation,
                        "discarding stale status check result"
                    );
                    return false;
                }
            };

            self.metrics.record_status_check(result.is_ok());
            let attempt = self.poll.record_attempt();

            let status = match result {
                Ok(status) => Some(status),
                Err(CheckError::Network(message)) => {
                    warn!(
                        invoice_id = %self.invoice_id,
                        attempt = attempt.attempts_used,
                        error = %message,
                        "transient status check failure, treated as pending"
                    );
                    None
                }
            };

            match status {
                Some(GatewayStatus::Paid) => {
                    info!(
                        invoice_id = %self.invoice_id,
                        attempts = attempt.attempts_used,
                        origin = origin.as_str(),
                        "payment confirmed"
                    );
                    self.metrics.record_payment_succeeded();
                    self.leave_polling(
                        &mut inner,
                        SessionState::Succeeded {
                            intent,
                            artifacts: Vec::new(),
                        },
                    );
                    if self.fetch_artifacts && !inner.artifact_fetch_started {
                        inner.artifact_fetch_started = true;
                        AfterCheck::FetchArtifacts
                    } else {
                        AfterCheck::Done
                    }
                }
                Some(status @ (GatewayStatus::Failed | GatewayStatus::Cancelled)) => {
                    info!(
                        invoice_id = %self.invoice_id,
                        status = %status,
                        attempts = attempt.attempts_used,
                        "gateway declined payment"
                    );
                    self.metrics.record_payment_declined();
                    self.leave_polling(
                        &mut inner,
                        SessionState::Failed {
                            intent: Some(intent),
                            reason: FailureReason::GatewayDeclined { status },
                        },
                    );
                    AfterCheck::Done
                }
                Some(GatewayStatus::Pending) | None => {
                    if attempt.exhausted {
                        info!(
                            invoice_id = %self.invoice_id,
                            attempts = attempt.attempts_used,
                            "attempt budget exhausted without a terminal status"
                        );
                        self.metrics.record_payment_timed_out();
                        self.leave_polling(
                            &mut inner,
                            SessionState::Failed {
                                intent: Some(intent),
                                reason: FailureReason::PollingTimeout {
                                    attempts: attempt.attempts_used,
                                },
                            },
                        );
                        AfterCheck::Done
                    } else {
                        AfterCheck::KeepPolling
                    }
                }
            }
        };

        match action {
            AfterCheck::KeepPolling => true,
            AfterCheck::Done => false,
            AfterCheck::FetchArtifacts => {
                self.fetch_artifacts_once().await;
                false
            }
        }
    }

    /// Transition out of `Polling`: the timer stops first, then the state
    /// changes and observers are notified.
    fn leave_polling(&self, inner: &mut SessionInner, next: SessionState) {
        self.poll.stop();
        inner.state = next;
        inner.generation += 1;
        self.touch_and_notify(inner);
    }

    async fn fetch_artifacts_once(self: &Arc<Self>) {
        let result = self.artifacts.fetch(&self.invoice_id).await;
        let mut inner = self.lock_inner();
        if inner.disposed {
            return;
        }
        match result {
            Ok(list) => {
                self.metrics.record_artifact_fetch(true);
                if let SessionState::Succeeded { artifacts, .. } = &mut inner.state {
                    if artifacts.is_empty() {
                        *artifacts = list;
                    }
                }
            }
            Err(err) => {
                self.metrics.record_artifact_fetch(false);
                warn!(
                    invoice_id = %self.invoice_id,
                    error = %err,
                    "payment succeeded but artifacts are unavailable"
                );
                inner.artifact_warning = Some(err.to_string());
            }
        }
        self.touch_and_notify(&mut inner);
    }

    fn touch_and_notify(&self, inner: &mut SessionInner) {
        inner.updated_at = Utc::now();
        self.watch_tx.send_replace(self.snapshot_from(inner));
    }

    fn snapshot_from(&self, inner: &SessionInner) -> SessionSnapshot {
        let intent = inner.state.intent();
        SessionSnapshot {
            session_id: self.session_id.clone(),
            invoice_id: self.invoice_id.clone(),
            provider: self.provider,
            amount: self.amount,
            currency: self.currency.clone(),
            state: inner.state.phase(),
            payment_url: intent.map(|i| i.payment_url.clone()),
            provider_payment_id: intent.map(|i| i.provider_payment_id.clone()),
            attempts_used: self.poll.attempts_used(),
            max_attempts: self.poll.max_attempts(),
            last_error: inner.state.failure().cloned(),
            artifacts: inner.state.artifacts().to_vec(),
            artifact_warning: inner.artifact_warning.clone(),
            disposed: inner.disposed,
            created_at: self.created_at,
            updated_at: inner.updated_at,
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
