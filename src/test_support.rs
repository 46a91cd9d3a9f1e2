//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use p256::SecretKey;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::codec::base64url_encode;
use crate::ports::{PushSender, TemplateChannel};
use crate::push::encrypt::HEADER_LEN;
use crate::push::keys::{
    AUTH_SECRET_LEN, PUBLIC_KEY_LEN, SALT_LEN, derive_from_shared_secret, uncompressed_point,
};
use crate::push::sender::EXPIRED_SUBSCRIPTION_ERROR;
use crate::types::channel::{AlimtalkOptions, ChannelResult};
use crate::types::push::{PushMessage, PushResult, PushSubscription};

/// The browser side of a subscription.
pub(crate) struct SubscriberKeys {
    pub(crate) secret: SecretKey,
    pub(crate) public_key: [u8; PUBLIC_KEY_LEN],
    pub(crate) auth: [u8; AUTH_SECRET_LEN],
    pub(crate) p256dh: String,
    pub(crate) auth_b64: String,
}

impl SubscriberKeys {
    pub(crate) fn subscription(&self, endpoint: impl Into<String>) -> PushSubscription {
        PushSubscription::new(endpoint, self.p256dh.clone(), self.auth_b64.clone())
    }
}

pub(crate) fn subscriber_keys() -> SubscriberKeys {
    let secret = SecretKey::random(&mut OsRng);
    let public_key = uncompressed_point(&secret.public_key()).expect("public key");
    let mut auth = [0u8; AUTH_SECRET_LEN];
    OsRng.fill_bytes(&mut auth);
    SubscriberKeys {
        secret,
        public_key,
        auth,
        p256dh: base64url_encode(public_key),
        auth_b64: base64url_encode(auth),
    }
}

/// Decrypts an aes128gcm body the way a user agent would.
pub(crate) fn decrypt_body(body: &[u8], subscriber: &SubscriberKeys) -> Result<Vec<u8>, String> {
    if body.len() < HEADER_LEN {
        return Err(format!("body too short: {}", body.len()));
    }
    let salt: [u8; SALT_LEN] = body[..SALT_LEN].try_into().map_err(|_| "salt")?;
    let id_len = body[20] as usize;
    if id_len != PUBLIC_KEY_LEN {
        return Err(format!("unexpected key id length {id_len}"));
    }
    let server_public_key: [u8; PUBLIC_KEY_LEN] =
        body[21..HEADER_LEN].try_into().map_err(|_| "key id")?;
    let server = p256::PublicKey::from_sec1_bytes(&server_public_key)
        .map_err(|err| format!("server key: {err}"))?;
    let shared =
        p256::ecdh::diffie_hellman(subscriber.secret.to_nonzero_scalar(), server.as_affine());
    let (cek, nonce) = derive_from_shared_secret(
        shared.raw_secret_bytes().as_slice(),
        &subscriber.auth,
        &subscriber.public_key,
        &server_public_key,
        &salt,
    );

    let cipher = Aes128Gcm::new_from_slice(&cek).map_err(|err| err.to_string())?;
    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), &body[HEADER_LEN..])
        .map_err(|_| "authentication failed".to_string())?;
    while plaintext.last() == Some(&0) {
        plaintext.pop();
    }
    match plaintext.pop() {
        Some(0x02) => Ok(plaintext),
        other => Err(format!("missing final record delimiter: {other:?}")),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Default)]
struct ServerLog {
    responses: HashMap<String, (u16, String)>,
    requests: Vec<RecordedRequest>,
}

/// In-process HTTP endpoint that records every request and answers from a
/// per-path table (`200` with an empty body otherwise).
#[derive(Clone)]
pub(crate) struct FakeServer {
    addr: SocketAddr,
    log: Arc<Mutex<ServerLog>>,
}

impl FakeServer {
    pub(crate) async fn start() -> Self {
        let log = Arc::new(Mutex::new(ServerLog::default()));
        let router = Router::new()
            .fallback(record_request)
            .with_state(Arc::clone(&log));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake server");
        });
        Self { addr, log }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub(crate) fn respond(&self, path: &str, status: u16, body: &str) {
        self.log
            .lock()
            .expect("server log")
            .responses
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().expect("server log").requests.clone()
    }
}

async fn record_request(
    State(log): State<Arc<Mutex<ServerLog>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let mut log = log.lock().expect("server log");
    let path = uri.path().to_string();
    log.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        headers,
        body: body.to_vec(),
    });
    let (status, body) = log
        .responses
        .get(&path)
        .cloned()
        .unwrap_or((200, String::new()));
    (
        StatusCode::from_u16(status).expect("status code"),
        body,
    )
}

/// A URL nothing is listening on.
pub(crate) async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/push/closed")
}

#[derive(Default)]
struct SenderScript {
    statuses: HashMap<String, u16>,
    delays: HashMap<String, Duration>,
    panics: HashMap<String, String>,
    sent: Vec<(String, PushMessage)>,
}

/// Push sender that answers from a script: `201` unless configured.
#[derive(Clone, Default)]
pub(crate) struct RecordingSender {
    script: Arc<Mutex<SenderScript>>,
}

impl RecordingSender {
    pub(crate) fn with_status(self, endpoint: &str, status: u16) -> Self {
        self.script
            .lock()
            .expect("script")
            .statuses
            .insert(endpoint.to_string(), status);
        self
    }

    pub(crate) fn with_delay(self, endpoint: &str, delay: Duration) -> Self {
        self.script
            .lock()
            .expect("script")
            .delays
            .insert(endpoint.to_string(), delay);
        self
    }

    pub(crate) fn with_panic(self, endpoint: &str, reason: &str) -> Self {
        self.script
            .lock()
            .expect("script")
            .panics
            .insert(endpoint.to_string(), reason.to_string());
        self
    }

    pub(crate) fn sent(&self) -> Vec<(String, PushMessage)> {
        self.script.lock().expect("script").sent.clone()
    }
}

impl PushSender for RecordingSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = PushResult> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a PushSubscription,
        message: &'a PushMessage,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let endpoint = subscription.endpoint.clone();
            let (status, delay, panic) = {
                let mut script = self.script.lock().expect("script");
                script.sent.push((endpoint.clone(), message.clone()));
                (
                    script.statuses.get(&endpoint).copied().unwrap_or(201),
                    script.delays.get(&endpoint).copied(),
                    script.panics.get(&endpoint).cloned(),
                )
            };
            if let Some(reason) = panic {
                panic!("{reason}");
            }
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match status {
                200 | 201 => PushResult::delivered(status, endpoint),
                0 => PushResult::transport_failure(endpoint, "connection refused"),
                404 | 410 => PushResult::failed(status, endpoint, EXPIRED_SUBSCRIPTION_ERROR),
                _ => PushResult::failed(
                    status,
                    endpoint,
                    format!("Push service returned {status}: "),
                ),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChannelCall {
    Templated {
        to: String,
        template_code: String,
        message: String,
        options: AlimtalkOptions,
    },
    Plain {
        to: String,
        message: String,
        title: Option<String>,
    },
}

/// Template channel returning fixed results and recording every call.
#[derive(Clone)]
pub(crate) struct FakeChannel {
    templated: ChannelResult,
    plain: ChannelResult,
    calls: Arc<Mutex<Vec<ChannelCall>>>,
}

impl FakeChannel {
    pub(crate) fn new(templated: ChannelResult, plain: ChannelResult) -> Self {
        Self {
            templated,
            plain,
            calls: Arc::default(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().expect("calls").clone()
    }
}

impl TemplateChannel for FakeChannel {
    type TemplatedFut<'a>
        = Pin<Box<dyn Future<Output = ChannelResult> + Send + 'a>>
    where
        Self: 'a;
    type PlainFut<'a>
        = Pin<Box<dyn Future<Output = ChannelResult> + Send + 'a>>
    where
        Self: 'a;

    fn send_templated_message<'a>(
        &'a self,
        to: &'a str,
        template_code: &'a str,
        message: &'a str,
        options: &'a AlimtalkOptions,
    ) -> Self::TemplatedFut<'a> {
        self.calls.lock().expect("calls").push(ChannelCall::Templated {
            to: to.to_string(),
            template_code: template_code.to_string(),
            message: message.to_string(),
            options: options.clone(),
        });
        let result = self.templated.clone();
        Box::pin(async move { result })
    }

    fn send_plain_message<'a>(
        &'a self,
        to: &'a str,
        message: &'a str,
        title: Option<&'a str>,
    ) -> Self::PlainFut<'a> {
        self.calls.lock().expect("calls").push(ChannelCall::Plain {
            to: to.to_string(),
            message: message.to_string(),
            title: title.map(str::to_string),
        });
        let result = self.plain.clone();
        Box::pin(async move { result })
    }
}
