//! Shared test fixtures: scripted gateway/artifact fakes and session helpers

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::application::services::payment_session::{PaymentSession, SessionParams};
use crate::application::services::session_registry::SessionRegistry;
use crate::config::AppConfig;
use crate::domain::{
    Artifact, ArtifactKind, CreatePaymentRequest, GatewayStatus, PaymentIntent, PaymentProvider,
    SessionPhase,
};
use crate::infrastructure::adapters::{ArtifactSource, GatewayApi};
use crate::shared::error::{CheckError, FetchError, InitiationError};
use crate::shared::metrics::MetricsUtils;

pub const TEST_INVOICE: &str = "inv-1";

pub fn test_intent() -> PaymentIntent {
    PaymentIntent {
        payment_url: "https://gw/pay/1".to_string(),
        provider_payment_id: "p1".to_string(),
    }
}

pub fn ticket_artifact() -> Artifact {
    Artifact {
        id: "t-1".to_string(),
        kind: ArtifactKind::VisitTicket,
        title: "Visit ticket".to_string(),
        payload: serde_json::json!({ "cabinet": 12 }),
    }
}

/// Gateway fake driven by scripted status replies.
///
/// Status replies are consumed per invoice first, then from the shared
/// queue; an empty script reports `Pending`, which mirrors a gateway that
/// has not settled yet. `hold_checks` gates every status call behind a
/// semaphore so tests can keep a check in flight.
pub struct MockGateway {
    create_reply: Mutex<Result<PaymentIntent, InitiationError>>,
    script: Mutex<VecDeque<Result<GatewayStatus, CheckError>>>,
    keyed_script: Mutex<HashMap<String, VecDeque<Result<GatewayStatus, CheckError>>>>,
    hold: Mutex<Option<Arc<Semaphore>>>,
    pub create_calls: AtomicU32,
    pub check_calls: AtomicU32,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            create_reply: Mutex::new(Ok(test_intent())),
            script: Mutex::new(VecDeque::new()),
            keyed_script: Mutex::new(HashMap::new()),
            hold: Mutex::new(None),
            create_calls: AtomicU32::new(0),
            check_calls: AtomicU32::new(0),
        })
    }

    pub fn set_create_reply(&self, reply: Result<PaymentIntent, InitiationError>) {
        *self.create_reply.lock().unwrap() = reply;
    }

    pub fn script(&self, statuses: Vec<Result<GatewayStatus, CheckError>>) {
        *self.script.lock().unwrap() = statuses.into();
    }

    pub fn script_for(&self, invoice_id: &str, statuses: Vec<Result<GatewayStatus, CheckError>>) {
        self.keyed_script
            .lock()
            .unwrap()
            .insert(invoice_id.to_string(), statuses.into());
    }

    /// Gate all subsequent checks; release them with `add_permits`
    pub fn hold_checks(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.hold.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn create_payment(
        &self,
        _request: CreatePaymentRequest,
    ) -> Result<PaymentIntent, InitiationError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_reply.lock().unwrap().clone()
    }

    async fn check_status(&self, invoice_id: &str) -> Result<GatewayStatus, CheckError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.expect("check gate closed");
            permit.forget();
        }

        if let Some(queue) = self.keyed_script.lock().unwrap().get_mut(invoice_id) {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(GatewayStatus::Pending))
    }
}

/// Artifact source fake returning one visit ticket unless told otherwise
pub struct MockArtifacts {
    reply: Mutex<Result<Vec<Artifact>, FetchError>>,
    pub fetch_calls: AtomicU32,
}

impl MockArtifacts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Ok(vec![ticket_artifact()])),
            fetch_calls: AtomicU32::new(0),
        })
    }

    pub fn set_reply(&self, reply: Result<Vec<Artifact>, FetchError>) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl ArtifactSource for MockArtifacts {
    async fn fetch(&self, _invoice_id: &str) -> Result<Vec<Artifact>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.reply.lock().unwrap().clone()
    }
}

/// Configuration tuned for paused-clock tests
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.polling.poll_interval_ms = 25;
    config.polling.auto_start = false;
    config.rate_limit.enabled = false;
    config
}

pub fn test_session(
    gateway: &Arc<MockGateway>,
    artifacts: &Arc<MockArtifacts>,
    max_attempts: u32,
) -> Arc<PaymentSession> {
    test_session_with_interval(gateway, artifacts, max_attempts, Duration::from_millis(25))
}

pub fn test_session_with_interval(
    gateway: &Arc<MockGateway>,
    artifacts: &Arc<MockArtifacts>,
    max_attempts: u32,
    poll_interval: Duration,
) -> Arc<PaymentSession> {
    let gateway: Arc<dyn GatewayApi> = gateway.clone();
    let artifacts: Arc<dyn ArtifactSource> = artifacts.clone();
    PaymentSession::new(
        SessionParams {
            invoice_id: TEST_INVOICE.to_string(),
            amount: 150_000.0,
            currency: "UZS".to_string(),
            provider: PaymentProvider::Click,
            return_url: "https://clinic.example/payments/return".to_string(),
            cancel_url: "https://clinic.example/payments/cancel".to_string(),
            max_attempts,
            poll_interval,
            fetch_artifacts: true,
        },
        gateway,
        artifacts,
        Arc::new(MetricsUtils::new()),
    )
}

pub fn test_registry(gateway: &Arc<MockGateway>, artifacts: &Arc<MockArtifacts>) -> SessionRegistry {
    let gateway: Arc<dyn GatewayApi> = gateway.clone();
    let artifacts: Arc<dyn ArtifactSource> = artifacts.clone();
    SessionRegistry::new(
        Arc::new(test_config()),
        gateway,
        artifacts,
        Arc::new(MetricsUtils::new()),
    )
}

/// Wait until a session reaches the given phase; panics if it never does
pub async fn wait_for_phase(session: &Arc<PaymentSession>, phase: SessionPhase) {
    for _ in 0..10_000 {
        if session.snapshot().state == phase {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "session never reached {:?}, still {:?}",
        phase,
        session.snapshot().state
    );
}
