//! Fake ports shared by the dispatcher integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reauth_core::{Dispatcher, DispatcherConfig, Reauthenticator, Transport};
use reauth_domain::{
    ApiError, HttpMethod, RawResponse, RefreshOutcome, RequestDescriptor, TransportError,
};
use tokio::sync::Notify;

type Responder =
    dyn Fn(&RequestDescriptor, usize) -> Result<RawResponse, TransportError> + Send + Sync;

/// Transport answering from a closure; counts calls.
pub struct ScriptedTransport {
    calls: AtomicUsize,
    delay: Option<Duration>,
    respond: Box<Responder>,
}

impl ScriptedTransport {
    pub fn new(
        respond: impl Fn(&RequestDescriptor, usize) -> Result<RawResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), delay: None, respond: Box::new(respond) })
    }

    /// 200 for requests carrying `token`, 401 otherwise.
    pub fn accepting(token: &'static str) -> Arc<Self> {
        Self::new(move |request, _| {
            if request.auth_token() == Some(token) {
                Ok(RawResponse::new(200).with_body(request.url().as_bytes().to_vec()))
            } else {
                Ok(RawResponse::new(401).with_body(b"token expired".to_vec()))
            }
        })
    }

    /// Always answers `status`.
    pub fn always(status: u16) -> Arc<Self> {
        Self::new(move |_, _| Ok(RawResponse::new(status)))
    }

    pub fn slow(delay: Duration, status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
            respond: Box::new(move |_, _| Ok(RawResponse::new(status))),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(request, call)
    }
}

enum Reply {
    Outcome(RefreshOutcome),
    Fail,
    Hang,
    Panic,
}

/// Reauthenticator that counts calls and tracks concurrency.
pub struct CountingReauthenticator {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    reply: Reply,
}

impl CountingReauthenticator {
    fn build(reply: Reply, gate: Option<Arc<Notify>>, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            gate,
            delay,
            reply,
        })
    }

    pub fn renewing(token: &str) -> Arc<Self> {
        Self::build(Reply::Outcome(RefreshOutcome::renewed(token)), None, None)
    }

    pub fn denying() -> Arc<Self> {
        Self::build(Reply::Outcome(RefreshOutcome::Denied), None, None)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(Reply::Fail, None, None)
    }

    pub fn hanging() -> Arc<Self> {
        Self::build(Reply::Hang, None, None)
    }

    pub fn panicking() -> Arc<Self> {
        Self::build(Reply::Panic, None, None)
    }

    /// Renews only after `gate` is notified.
    pub fn gated(token: &str, gate: Arc<Notify>) -> Arc<Self> {
        Self::build(Reply::Outcome(RefreshOutcome::renewed(token)), Some(gate), None)
    }

    pub fn gated_denial(gate: Arc<Notify>) -> Arc<Self> {
        Self::build(Reply::Outcome(RefreshOutcome::Denied), Some(gate), None)
    }

    pub fn slow(token: &str, delay: Duration) -> Arc<Self> {
        Self::build(Reply::Outcome(RefreshOutcome::renewed(token)), None, Some(delay))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reauthenticator for CountingReauthenticator {
    async fn reauthenticate(
        &self,
        _trigger: &RequestDescriptor,
    ) -> Result<RefreshOutcome, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Outcome(outcome) => Ok(outcome.clone()),
            Reply::Fail => Err(ApiError::Internal("token endpoint unreachable".into())),
            Reply::Hang => std::future::pending().await,
            Reply::Panic => panic!("reauthenticator blew up"),
        }
    }
}

pub fn dispatcher(
    transport: Arc<ScriptedTransport>,
    reauthenticator: Arc<CountingReauthenticator>,
) -> Dispatcher {
    dispatcher_with(transport, reauthenticator, DispatcherConfig::default())
}

pub fn dispatcher_with(
    transport: Arc<ScriptedTransport>,
    reauthenticator: Arc<CountingReauthenticator>,
    config: DispatcherConfig,
) -> Dispatcher {
    Dispatcher::new(transport, reauthenticator, config)
}

/// GET `https://api.test{path}` carrying `token`.
pub fn request(path: &str, token: &str) -> RequestDescriptor {
    RequestDescriptor::builder(HttpMethod::Get, format!("https://api.test{path}"))
        .header("accept", "application/json")
        .auth_token(token)
        .build()
        .expect("descriptor")
}

/// Wait until `expected` requests are parked on the outstanding refresh.
pub async fn wait_for_waiters(dispatcher: &Dispatcher, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while dispatcher.stats().waiting < expected {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("requests were never queued behind the refresh");
}
