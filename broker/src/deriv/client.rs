//! Blocking Deriv websocket client.
//!
//! One request is in flight at a time. Each carries a fresh `req_id` and the
//! client reads frames until the matching reply arrives, skipping anything
//! else the server pushes on the socket.

use std::fmt;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde_json::{Value, json};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::auth::{self, Token};
use super::types;
use crate::error::BrokerError;
use crate::types::Account;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_ENDPOINT: &str = "wss://ws.derivws.com/websockets/v3";

/// Connection settings for [`DerivClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub app_id: String,
    pub token: Token,
    /// Bound on every read.
    pub timeout: Duration,
    /// Idle time after which a `ping` precedes the next request.
    pub ping_interval: Duration,
    pub max_reconnect_attempts: u32,
    /// First reconnect delay; doubled on each further attempt.
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    pub fn new(app_id: &str, token: Token) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_id: app_id.to_string(),
            token,
            timeout: Duration::from_secs(30),
            ping_interval: Duration::from_secs(30),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(2000),
        }
    }

    /// Endpoint with the `app_id` query parameter.
    pub fn url(&self) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{sep}app_id={}", self.endpoint, self.app_id)
    }

    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.reconnect_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("token", &auth::redact(&self.token))
            .field("timeout", &self.timeout)
            .field("ping_interval", &self.ping_interval)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish()
    }
}

/// An authorised session.
pub struct DerivClient {
    config: ClientConfig,
    socket: Option<Socket>,
    next_req_id: u64,
    last_activity: Instant,
    account: Account,
}

impl DerivClient {
    /// Open the socket and authorise.
    pub fn connect(config: ClientConfig) -> Result<Self, BrokerError> {
        let mut client = Self {
            config,
            socket: None,
            next_req_id: 0,
            last_activity: Instant::now(),
            account: Account {
                loginid: String::new(),
                currency: String::new(),
                balance: 0.0,
                is_virtual: false,
            },
        };
        client.open()?;
        Ok(client)
    }

    /// Account returned by the last `authorize`.
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Send a request and wait for its reply.
    ///
    /// A connection failure or timeout triggers one reconnect cycle and a
    /// single retry of the same request.
    pub fn request(&mut self, payload: Value) -> Result<Value, BrokerError> {
        match self.exchange(&payload) {
            Err(e) if e.is_transient() => {
                warn!("Request failed ({e}), reconnecting");
                self.reconnect()?;
                self.exchange(&payload)
            }
            other => other,
        }
    }

    /// Send a request that must reach the venue at most once.
    ///
    /// A transient failure still reconnects, but the request is not resent:
    /// the venue may have acted on it before the reply was lost.
    pub fn request_once(&mut self, payload: Value) -> Result<Value, BrokerError> {
        match self.exchange(&payload) {
            Err(e) if e.is_transient() => {
                warn!("Request failed ({e}), reconnecting without resending");
                self.reconnect()?;
                Err(BrokerError::Connection(format!(
                    "{e}; request not resent, its outcome is unknown"
                )))
            }
            other => other,
        }
    }

    /// Close the socket.
    pub fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None) {
                debug!("Close handshake failed: {e}");
            }
            // Drain until the server acknowledges or the read times out.
            while socket.read().is_ok() {}
        }
    }

    fn open(&mut self) -> Result<(), BrokerError> {
        let url = self.config.url();
        info!("Connecting to {}", self.config.endpoint);
        let (socket, _response) = tungstenite::connect(url.as_str())
            .map_err(|e| BrokerError::Connection(format!("handshake with {url} failed: {e}")))?;
        set_read_timeout(&socket, self.config.timeout)?;
        self.socket = Some(socket);
        self.last_activity = Instant::now();

        let req_id = self.req_id();
        let payload = auth::authorize_request(&self.config.token, req_id)?;
        self.transmit(&payload)?;
        let response = self.await_reply(req_id)?;
        self.account = auth::parse_authorize(response)?;
        info!(
            "Authorised {} ({}, token {})",
            self.account.loginid,
            self.account.kind(),
            auth::redact(&self.config.token)
        );
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), BrokerError> {
        self.socket = None;
        for attempt in 0..self.config.max_reconnect_attempts {
            let delay = self.config.backoff(attempt);
            info!(
                "Reconnect attempt {}/{} in {:?}",
                attempt + 1,
                self.config.max_reconnect_attempts,
                delay
            );
            thread::sleep(delay);
            match self.open() {
                Ok(()) => return Ok(()),
                Err(BrokerError::Auth(msg)) => return Err(BrokerError::Auth(msg)),
                Err(e) => warn!("Reconnect attempt {} failed: {e}", attempt + 1),
            }
        }
        Err(BrokerError::Connection(format!(
            "gave up after {} reconnect attempts",
            self.config.max_reconnect_attempts
        )))
    }

    fn exchange(&mut self, payload: &Value) -> Result<Value, BrokerError> {
        if self.last_activity.elapsed() >= self.config.ping_interval {
            debug!("Idle for {:?}, sending ping", self.last_activity.elapsed());
            self.send_once(types::ping_request())?;
        }
        self.send_once(payload.clone())
    }

    fn send_once(&mut self, mut payload: Value) -> Result<Value, BrokerError> {
        let req_id = self.req_id();
        payload["req_id"] = json!(req_id);
        debug!("-> {payload}");
        self.transmit(&payload.to_string())?;
        let response = self.await_reply(req_id)?;
        types::check(response)
    }

    fn req_id(&mut self) -> u64 {
        self.next_req_id += 1;
        self.next_req_id
    }

    /// The frame handed to the socket is an owned copy of `text`; tungstenite
    /// holds it until written and it is not wiped afterwards.
    fn transmit(&mut self, text: &str) -> Result<(), BrokerError> {
        let socket = self.socket.as_mut().ok_or(BrokerError::NotConnected)?;
        socket
            .send(Message::Text(text.to_owned()))
            .map_err(|e| transport_error("send", e))
    }

    fn await_reply(&mut self, req_id: u64) -> Result<Value, BrokerError> {
        let deadline = Instant::now() + self.config.timeout;
        let socket = self.socket.as_mut().ok_or(BrokerError::NotConnected)?;
        loop {
            if Instant::now() >= deadline {
                return Err(BrokerError::Timeout(format!("no reply to req_id {req_id}")));
            }
            let text = match socket.read().map_err(|e| transport_error("read", e))? {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    return Err(BrokerError::Connection(format!(
                        "server closed the connection: {frame:?}"
                    )));
                }
                // Pongs to server pings are queued by the socket itself.
                _ => continue,
            };
            let response: Value = serde_json::from_str(&text)
                .map_err(|e| BrokerError::Protocol(format!("invalid JSON frame: {e}")))?;
            if response.get("req_id").and_then(Value::as_u64) == Some(req_id) {
                self.last_activity = Instant::now();
                return Ok(response);
            }
            debug!(
                "Skipping unrelated {} frame",
                response["msg_type"].as_str().unwrap_or("unknown")
            );
        }
    }
}

impl Drop for DerivClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn set_read_timeout(socket: &Socket, timeout: Duration) -> Result<(), BrokerError> {
    let result = match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout)),
        MaybeTlsStream::NativeTls(stream) => stream.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    };
    result.map_err(|e| BrokerError::Connection(format!("failed to set read timeout: {e}")))
}

fn transport_error(context: &str, e: tungstenite::Error) -> BrokerError {
    match e {
        tungstenite::Error::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            BrokerError::Timeout(format!("{context}: {io}"))
        }
        other => BrokerError::Connection(format!("{context}: {other}")),
    }
}
