//! Redirect and authentication-challenge policy.

use tracing::debug;

use crate::config::Config;
use crate::handshake::outcome::RetryDecision;
use crate::protocol::{Credential, Endpoint, ParsedResponse};

/// Decides whether a response warrants another attempt.
///
/// Consulted once per response, before any upgrade validation.
pub trait RetryPolicy {
    /// Evaluate `response` to a request sent to `endpoint`, which carried
    /// `sent` as its credential (if any). `initial` is where the handshake
    /// started, before any redirect.
    fn evaluate(
        &self,
        initial: &Endpoint,
        endpoint: &Endpoint,
        sent: Option<&Credential>,
        response: &ParsedResponse,
    ) -> RetryDecision;
}

impl<P: RetryPolicy + ?Sized> RetryPolicy for &P {
    fn evaluate(
        &self,
        initial: &Endpoint,
        endpoint: &Endpoint,
        sent: Option<&Credential>,
        response: &ParsedResponse,
    ) -> RetryDecision {
        (**self).evaluate(initial, endpoint, sent, response)
    }
}

/// Policy that never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn evaluate(
        &self,
        _: &Endpoint,
        _: &Endpoint,
        _: Option<&Credential>,
        _: &ParsedResponse,
    ) -> RetryDecision {
        RetryDecision::None
    }
}

/// HTTP redirect statuses that carry a `Location`.
const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];

/// Follows 3xx redirects and answers `401` challenges with a configured
/// credential.
///
/// A credential is offered at most once per challenge: if the rejected request
/// already carried it, the `401` is final. It is only ever offered to the
/// origin (scheme, host and port) the handshake started at.
#[derive(Debug, Clone)]
pub struct StandardRetryPolicy {
    follow_redirects: bool,
    credential: Option<Credential>,
}

impl StandardRetryPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(follow_redirects: bool, credential: Option<Credential>) -> Self {
        Self {
            follow_redirects,
            credential,
        }
    }

    /// Policy matching a handshake configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.follow_redirects, config.credential.clone())
    }

    fn redirect(&self, endpoint: &Endpoint, response: &ParsedResponse) -> RetryDecision {
        let Some(location) = response.header("location") else {
            debug!(status = response.status(), "redirect without Location header");
            return RetryDecision::None;
        };
        match endpoint.resolve(location) {
            Ok(next) => RetryDecision::Redirect(next),
            Err(err) => {
                debug!(%location, error = %err, "ignoring unusable redirect target");
                RetryDecision::None
            }
        }
    }

    fn challenge(
        &self,
        initial: &Endpoint,
        endpoint: &Endpoint,
        sent: Option<&Credential>,
        response: &ParsedResponse,
    ) -> RetryDecision {
        let Some(credential) = self.credential.as_ref() else {
            return RetryDecision::None;
        };
        if !endpoint.same_origin(initial) {
            debug!(%endpoint, %initial, "not answering challenge from another origin");
            return RetryDecision::None;
        }
        if sent == Some(credential) {
            return RetryDecision::None;
        }
        let asked = response
            .headers()
            .get_all("www-authenticate")
            .any(|challenge| credential.answers(challenge));
        if asked {
            RetryDecision::AuthChallenge(credential.clone())
        } else {
            RetryDecision::None
        }
    }
}

impl Default for StandardRetryPolicy {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl RetryPolicy for StandardRetryPolicy {
    fn evaluate(
        &self,
        initial: &Endpoint,
        endpoint: &Endpoint,
        sent: Option<&Credential>,
        response: &ParsedResponse,
    ) -> RetryDecision {
        match response.status() {
            status if self.follow_redirects && REDIRECT_STATUSES.contains(&status) => {
                self.redirect(endpoint, response)
            }
            401 => self.challenge(initial, endpoint, sent, response),
            _ => RetryDecision::None,
        }
    }
}
