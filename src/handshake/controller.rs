use std::time::Duration;

use tracing::{debug, warn};

use crate::close::CloseCode;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::handshake::classify::{ClassifyContext, ResponseClassifier, UNREADABLE_RESPONSE};
use crate::handshake::observer::{HandshakeObserver, NoopObserver};
use crate::handshake::outcome::{HandshakeOutcome, RetryDecision, Verdict};
use crate::handshake::policy::{RetryPolicy, StandardRetryPolicy};
use crate::handshake::state::HandshakeState;
use crate::protocol::{
    Credential, Endpoint, HEADER_TERMINATOR, HandshakeRequest, HeaderSet, NonceKey, OsRandom,
    ParsedResponse, PendingResponse, RandomSource,
};
use crate::transport::Transport;

/// Reason reported when the retry budget runs out.
pub const TOO_MANY_REDIRECTS: &str = "Too many redirects";
/// Reason reported when the owner cancels an unfinished handshake.
pub const CANCELLED: &str = "Handshake cancelled";

/// Drives the client handshake over a [`Transport`].
///
/// One controller performs one handshake: it dials, sends the upgrade
/// request, reads and classifies the response, retries on redirects and
/// authentication challenges, and finally reports exactly one outcome to its
/// [`HandshakeObserver`]. All per-attempt state (nonce, request, response
/// buffer) is rebuilt on every attempt.
///
/// ## Example
///
/// ```rust,ignore
/// use wsdial::{Config, Endpoint, HandshakeController, HandshakeOutcome};
/// use wsdial::transport::TcpTransport;
///
/// let endpoint = Endpoint::parse("ws://127.0.0.1:9001/chat")?;
/// let mut controller = HandshakeController::new(TcpTransport::new(), Config::new());
///
/// match controller.start(endpoint).await {
///     HandshakeOutcome::Opened(negotiated) => {
///         let transport = controller.into_transport().unwrap();
///         // hand `transport` to the framing layer
///     }
///     HandshakeOutcome::Closed(code, reason) => eprintln!("{code}: {reason}"),
/// }
/// ```
pub struct HandshakeController<T, R = OsRandom, P = StandardRetryPolicy, O = NoopObserver> {
    transport: T,
    random: R,
    classifier: ResponseClassifier<P>,
    observer: O,
    config: Config,
    state: HandshakeState,
    attempts: usize,
    credential: Option<Credential>,
    endpoint: Option<Endpoint>,
    nonce: Option<NonceKey>,
    last_status: Option<u16>,
    outcome: Option<HandshakeOutcome>,
}

impl<T: Transport> HandshakeController<T> {
    /// Create a controller using the OS random source, the standard retry
    /// policy derived from `config`, and no observer.
    pub fn new(transport: T, config: Config) -> Self {
        let policy = StandardRetryPolicy::from_config(&config);
        Self::from_parts(transport, OsRandom, policy, NoopObserver, config)
    }
}

impl<T, R, P, O> HandshakeController<T, R, P, O> {
    /// Create a controller from explicit collaborators.
    pub fn from_parts(transport: T, random: R, policy: P, observer: O, config: Config) -> Self {
        Self {
            transport,
            random,
            classifier: ResponseClassifier::new(policy),
            observer,
            config,
            state: HandshakeState::Idle,
            attempts: 0,
            credential: None,
            endpoint: None,
            nonce: None,
            last_status: None,
            outcome: None,
        }
    }

    /// Replace the random source. Intended to be called before `start`.
    pub fn with_random<R2>(self, random: R2) -> HandshakeController<T, R2, P, O> {
        let policy = self.classifier.into_policy();
        HandshakeController::from_parts(self.transport, random, policy, self.observer, self.config)
    }

    /// Replace the retry policy. Intended to be called before `start`.
    pub fn with_policy<P2>(self, policy: P2) -> HandshakeController<T, R, P2, O> {
        HandshakeController::from_parts(self.transport, self.random, policy, self.observer, self.config)
    }

    /// Replace the observer. Intended to be called before `start`.
    pub fn with_observer<O2>(self, observer: O2) -> HandshakeController<T, R, P, O2> {
        let policy = self.classifier.into_policy();
        HandshakeController::from_parts(self.transport, self.random, policy, observer, self.config)
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Attempts made so far, including retries.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Endpoint of the current (or last) attempt; after redirects this is
    /// the effective URL.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Nonce of the attempt in flight, if any.
    pub fn nonce(&self) -> Option<&NonceKey> {
        self.nonce.as_ref()
    }

    /// Status code of the last response received.
    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    /// Terminal outcome, once reached.
    pub fn outcome(&self) -> Option<&HandshakeOutcome> {
        self.outcome.as_ref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Hand the upgraded transport to the framing layer.
    ///
    /// Returns `None` unless the handshake opened.
    pub fn into_transport(self) -> Option<T> {
        (self.state == HandshakeState::Opened).then_some(self.transport)
    }

    fn base_headers(&self) -> HeaderSet {
        let mut headers = self.config.headers.clone();
        if let Some(origin) = &self.config.origin {
            headers.insert("Origin", origin.clone());
        }
        headers
    }
}

impl<T, R, P, O> HandshakeController<T, R, P, O>
where
    T: Transport,
    R: RandomSource,
    P: RetryPolicy,
    O: HandshakeObserver,
{
    /// Run the handshake against `endpoint` until it opens or fails.
    ///
    /// Resolves only once a terminal outcome is known. Calling `start` on a
    /// finished controller returns the recorded outcome without touching the
    /// transport or the observer.
    pub async fn start(&mut self, endpoint: Endpoint) -> HandshakeOutcome {
        if let Some(outcome) = &self.outcome {
            debug!(state = %self.state, "handshake already finished");
            return outcome.clone();
        }

        let initial = endpoint.clone();
        let mut endpoint = endpoint;
        let mut retries = 0usize;

        loop {
            let decision = match self.attempt(&initial, &endpoint).await {
                Verdict::Final(outcome) => return self.finish(outcome).await,
                Verdict::Retry(decision) => decision,
            };

            self.transport.close().await;
            self.nonce = None;
            self.state = HandshakeState::Retrying;
            retries += 1;

            if retries > self.config.limits.max_redirects {
                warn!(
                    retries,
                    max = self.config.limits.max_redirects,
                    "retry budget exhausted"
                );
                let outcome = HandshakeOutcome::closed(CloseCode::Normal, TOO_MANY_REDIRECTS);
                return self.finish(outcome).await;
            }

            match decision {
                RetryDecision::Redirect(next) => {
                    debug!(from = %endpoint, to = %next, "following redirect");
                    // Credentials never leave the origin they were sent to,
                    // including a wss to ws downgrade on the same host.
                    if !next.same_origin(&endpoint) {
                        self.credential = None;
                    }
                    endpoint = next;
                }
                RetryDecision::AuthChallenge(credential) => {
                    debug!(scheme = credential.scheme(), "answering authentication challenge");
                    self.credential = Some(credential);
                }
                // The classifier never asks for a retry without a reason.
                RetryDecision::None => {}
            }
        }
    }

    /// Tear down any open transport and forget the current nonce.
    ///
    /// Safe to call at any time, including when nothing is connected. An
    /// unfinished handshake returns to `Idle` so `start` can run a fresh
    /// attempt; a finished one keeps its outcome.
    pub async fn disconnect(&mut self) {
        debug!(state = %self.state, "disconnecting");
        self.transport.close().await;
        self.nonce = None;
        if !self.state.is_terminal() {
            self.state = HandshakeState::Idle;
        }
    }

    /// Abandon an unfinished handshake, reporting `Closed(Normal, "Handshake cancelled")`.
    ///
    /// A finished controller is left untouched and its outcome returned.
    pub async fn cancel(&mut self) -> HandshakeOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        self.finish(HandshakeOutcome::closed(CloseCode::Normal, CANCELLED))
            .await
    }

    async fn attempt(&mut self, initial: &Endpoint, endpoint: &Endpoint) -> Verdict {
        self.attempts += 1;
        self.endpoint = Some(endpoint.clone());
        self.last_status = None;
        self.state = HandshakeState::Connecting;
        let timeouts = self.config.timeouts.clone();
        debug!(attempt = self.attempts, %endpoint, "connecting");

        if let Err(err) = self
            .transport
            .dial(endpoint.host(), endpoint.port(), endpoint.is_secure(), timeouts.connect)
            .await
        {
            warn!(%endpoint, error = %err, "dial failed");
            return transport_failure(&err);
        }

        // Fresh for every attempt; a reused key would make the accept check meaningless.
        let nonce = match NonceKey::generate(&mut self.random) {
            Ok(nonce) => nonce,
            Err(err) => {
                warn!(error = %err, "nonce generation failed");
                return Verdict::Final(HandshakeOutcome::closed(
                    CloseCode::ProtocolError,
                    err.to_string(),
                ));
            }
        };
        self.nonce = Some(nonce.clone());

        let request = HandshakeRequest::new(
            endpoint,
            &nonce,
            &self.config.protocols,
            &self.base_headers(),
            self.credential.as_ref(),
        );
        let bytes = match request.to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "cannot encode upgrade request");
                return Verdict::Final(HandshakeOutcome::closed(
                    CloseCode::ProtocolError,
                    err.to_string(),
                ));
            }
        };

        if let Err(err) = self.transport.write(&bytes, timeouts.write).await {
            warn!(error = %err, "sending upgrade request failed");
            return transport_failure(&err);
        }

        self.state = HandshakeState::AwaitingResponse;
        let response = match self.read_response(timeouts.read).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "no usable response");
                return Verdict::Final(HandshakeOutcome::closed(
                    CloseCode::ProtocolError,
                    UNREADABLE_RESPONSE,
                ));
            }
        };
        self.last_status = Some(response.status());
        debug!(status = response.status(), "response received");

        let ctx = ClassifyContext {
            initial,
            endpoint,
            credential: self.credential.as_ref(),
            protocols: &self.config.protocols,
        };
        self.classifier.classify(&response, &nonce, &ctx)
    }

    async fn read_response(&mut self, limit: Duration) -> Result<ParsedResponse> {
        let max = self.config.limits.max_handshake_size;
        let mut pending = PendingResponse::new(max);

        while !pending.is_complete() {
            let chunk = self
                .transport
                .read_until(HEADER_TERMINATOR, max.saturating_sub(pending.len()), limit)
                .await?;
            if chunk.is_empty() {
                return Err(Error::ConnectionClosed);
            }
            pending.extend(&chunk)?;
        }

        pending.parse()
    }

    async fn finish(&mut self, outcome: HandshakeOutcome) -> HandshakeOutcome {
        match &outcome {
            HandshakeOutcome::Opened(negotiated) => {
                self.state = HandshakeState::Opened;
                debug!(
                    attempts = self.attempts,
                    protocol = ?negotiated.protocol,
                    extensions = ?negotiated.extensions,
                    "handshake complete"
                );
                self.observer.on_open(negotiated);
            }
            HandshakeOutcome::Closed(code, reason) => {
                self.transport.close().await;
                self.nonce = None;
                self.state = HandshakeState::Closed;
                warn!(attempts = self.attempts, %code, %reason, "handshake failed");
                self.observer.on_close(*code, reason);
            }
        }
        self.outcome = Some(outcome.clone());
        outcome
    }
}

fn transport_failure(err: &Error) -> Verdict {
    Verdict::Final(HandshakeOutcome::closed(
        CloseCode::for_transport_error(err),
        err.to_string(),
    ))
}

impl<T, R, P, O> std::fmt::Debug for HandshakeController<T, R, P, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeController")
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("endpoint", &self.endpoint)
            .field("last_status", &self.last_status)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}
