//! Response classification.
//!
//! Turns one parsed response into either a retry request or a final outcome.
//! The checks run in a fixed order and the first failing check decides the
//! reason reported to the owner.

use crate::close::CloseCode;
use crate::handshake::outcome::{HandshakeOutcome, Negotiated, RetryDecision, Verdict};
use crate::handshake::policy::RetryPolicy;
use crate::protocol::{Credential, Endpoint, NonceKey, ParsedResponse};

/// Reason reported when the header block never completes or cannot be parsed.
pub const UNREADABLE_RESPONSE: &str = "Unreadable HTTP response";
/// Reason for a missing or wrong `Connection` header.
pub const INVALID_CONNECTION: &str = "Invalid 'Connection' header";
/// Reason for a missing or wrong `Upgrade` header.
pub const INVALID_UPGRADE: &str = "Invalid 'Upgrade' header";
/// Reason for a missing or wrong `Sec-WebSocket-Accept` header.
pub const INVALID_ACCEPT: &str = "Invalid 'Sec-WebSocket-Accept' header";
/// Reason for a subprotocol the client never offered.
pub const INVALID_PROTOCOL: &str = "Invalid 'Sec-WebSocket-Protocol' header";

/// What the classifier needs to know about the request that was sent.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    /// Endpoint the handshake started at, before any redirect.
    pub initial: &'a Endpoint,
    /// Endpoint the request went to.
    pub endpoint: &'a Endpoint,
    /// Credential the request carried.
    pub credential: Option<&'a Credential>,
    /// Subprotocols the request offered.
    pub protocols: &'a [String],
}

/// Classifies handshake responses using a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct ResponseClassifier<P> {
    policy: P,
}

impl<P> ResponseClassifier<P> {
    /// Create a classifier around `policy`.
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Take back the retry policy.
    pub fn into_policy(self) -> P {
        self.policy
    }
}

impl<P: RetryPolicy> ResponseClassifier<P> {
    /// Classify `response` to the request identified by `nonce` and `ctx`.
    pub fn classify(
        &self,
        response: &ParsedResponse,
        nonce: &NonceKey,
        ctx: &ClassifyContext<'_>,
    ) -> Verdict {
        match self.policy.evaluate(ctx.initial, ctx.endpoint, ctx.credential, response) {
            RetryDecision::None => {}
            decision => return Verdict::Retry(decision),
        }
        Verdict::Final(verify_upgrade(response, nonce, ctx.protocols))
    }
}

/// Validate a response that will not be retried.
pub fn verify_upgrade(
    response: &ParsedResponse,
    nonce: &NonceKey,
    offered: &[String],
) -> HandshakeOutcome {
    let status = response.status();
    if status != 101 {
        return HandshakeOutcome::closed(
            CloseCode::from_http_status(status),
            response.status_line(),
        );
    }

    let headers = response.headers();

    if !headers.has_token("connection", "upgrade") {
        return HandshakeOutcome::closed(CloseCode::ProtocolError, INVALID_CONNECTION);
    }

    let upgrade_ok = headers
        .get("upgrade")
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    if !upgrade_ok {
        return HandshakeOutcome::closed(CloseCode::ProtocolError, INVALID_UPGRADE);
    }

    // Base64 is case-significant: exact comparison only.
    let expected = nonce.expected_accept();
    if headers.get("sec-websocket-accept") != Some(expected.as_str()) {
        return HandshakeOutcome::closed(CloseCode::ProtocolError, INVALID_ACCEPT);
    }

    let protocol = headers.get("sec-websocket-protocol").map(str::to_string);
    if let Some(selected) = protocol.as_deref() {
        if !offered.iter().any(|p| p == selected) {
            return HandshakeOutcome::closed(CloseCode::ProtocolError, INVALID_PROTOCOL);
        }
    }

    let extensions = headers
        .get_all("sec-websocket-extensions")
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();

    HandshakeOutcome::Opened(Negotiated {
        protocol,
        extensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::policy::{NoRetry, StandardRetryPolicy};
    use crate::protocol::RandomSource;

    struct Fixed;

    impl RandomSource for Fixed {
        fn fill(&mut self, buf: &mut [u8]) -> crate::Result<()> {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = i as u8;
            }
            Ok(())
        }
    }

    // Accept for the key produced by `Fixed`.
    const ACCEPT: &str = "Bz3qJYTGdOe8gUSpLosEdiLKDrk=";

    fn nonce() -> NonceKey {
        NonceKey::generate(&mut Fixed).unwrap()
    }

    fn classify_with<P: RetryPolicy>(policy: P, raw: &str, protocols: &[String]) -> Verdict {
        let endpoint = Endpoint::parse("ws://example.com/chat").unwrap();
        let ctx = ClassifyContext {
            initial: &endpoint,
            endpoint: &endpoint,
            credential: None,
            protocols,
        };
        let response = ParsedResponse::parse(raw.as_bytes()).unwrap();
        ResponseClassifier::new(policy).classify(&response, &nonce(), &ctx)
    }

    fn classify(raw: &str) -> Verdict {
        classify_with(NoRetry, raw, &[])
    }

    fn closed(code: CloseCode, reason: &str) -> Verdict {
        Verdict::Final(HandshakeOutcome::closed(code, reason))
    }

    fn switching(headers: &str) -> String {
        format!("HTTP/1.1 101 Switching Protocols\r\n{headers}\r\n")
    }

    #[test]
    fn test_success() {
        let verdict = classify(&switching(&format!(
            "Upgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {ACCEPT}\r\n"
        )));
        assert_eq!(
            verdict,
            Verdict::Final(HandshakeOutcome::Opened(Negotiated::default()))
        );
    }

    #[test]
    fn test_upgrade_header_case_insensitive() {
        let verdict = classify(&switching(&format!(
            "Upgrade: WebSocket\r\nConnection: upgrade\r\nSec-WebSocket-Accept: {ACCEPT}\r\n"
        )));
        assert!(matches!(verdict, Verdict::Final(HandshakeOutcome::Opened(_))));
    }

    #[test]
    fn test_connection_token_list() {
        let verdict = classify(&switching(&format!(
            "Upgrade: websocket\r\nConnection: keep-alive, Upgrade\r\nSec-WebSocket-Accept: {ACCEPT}\r\n"
        )));
        assert!(matches!(verdict, Verdict::Final(HandshakeOutcome::Opened(_))));
    }

    #[test]
    fn test_accept_is_case_sensitive() {
        let verdict = classify(&switching(&format!(
            "Upgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {}\r\n",
            ACCEPT.to_lowercase()
        )));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_ACCEPT));
    }

    #[test]
    fn test_accept_mismatch() {
        let verdict = classify(&switching(
            "Upgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n",
        ));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_ACCEPT));
    }

    #[test]
    fn test_accept_missing() {
        let verdict = classify(&switching("Upgrade: websocket\r\nConnection: Upgrade\r\n"));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_ACCEPT));
    }

    #[test]
    fn test_connection_missing() {
        let verdict = classify(&switching(&format!(
            "Upgrade: websocket\r\nSec-WebSocket-Accept: {ACCEPT}\r\n"
        )));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_CONNECTION));
    }

    #[test]
    fn test_connection_checked_before_upgrade() {
        let verdict = classify(&switching("Connection: close\r\nUpgrade: h2c\r\n"));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_CONNECTION));
    }

    #[test]
    fn test_upgrade_wrong() {
        let verdict = classify(&switching(&format!(
            "Upgrade: h2c\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {ACCEPT}\r\n"
        )));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_UPGRADE));
    }

    #[test]
    fn test_status_passthrough() {
        let verdict = classify("HTTP/1.1 403 Forbidden\r\n\r\n");
        assert_eq!(verdict, closed(CloseCode::Status(403), "HTTP/1.1 403 Forbidden"));

        let verdict = classify("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(verdict, closed(CloseCode::Status(200), "HTTP/1.1 200 OK"));
    }

    #[test]
    fn test_unfollowed_redirect_is_final() {
        let verdict = classify("HTTP/1.1 302 Found\r\nLocation: /x\r\n\r\n");
        assert_eq!(verdict, closed(CloseCode::Status(302), "HTTP/1.1 302 Found"));
    }

    #[test]
    fn test_policy_retry_wins() {
        let verdict = classify_with(
            StandardRetryPolicy::default(),
            "HTTP/1.1 302 Found\r\nLocation: /next\r\n\r\n",
            &[],
        );
        assert!(matches!(verdict, Verdict::Retry(RetryDecision::Redirect(_))));
    }

    #[test]
    fn test_negotiated_protocol_and_extensions() {
        let protocols = vec!["chat".to_string(), "superchat".to_string()];
        let verdict = classify_with(
            NoRetry,
            &switching(&format!(
                "Upgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {ACCEPT}\r\n\
                 Sec-WebSocket-Protocol: superchat\r\n\
                 Sec-WebSocket-Extensions: permessage-deflate; client_max_window_bits, x-custom\r\n"
            )),
            &protocols,
        );
        assert_eq!(
            verdict,
            Verdict::Final(HandshakeOutcome::Opened(Negotiated {
                protocol: Some("superchat".into()),
                extensions: vec![
                    "permessage-deflate; client_max_window_bits".into(),
                    "x-custom".into()
                ],
            }))
        );
    }

    #[test]
    fn test_unoffered_protocol_rejected() {
        let verdict = classify(&switching(&format!(
            "Upgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {ACCEPT}\r\n\
             Sec-WebSocket-Protocol: chat\r\n"
        )));
        assert_eq!(verdict, closed(CloseCode::ProtocolError, INVALID_PROTOCOL));
    }
}
