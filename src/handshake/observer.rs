//! Signals from the handshake to the connection that owns it.

use crate::close::CloseCode;
use crate::handshake::outcome::Negotiated;

/// Receives the single terminal signal of a handshake.
///
/// Exactly one of the two methods is called, once, per controller.
pub trait HandshakeObserver {
    /// The upgrade was verified; framing may begin.
    fn on_open(&mut self, negotiated: &Negotiated) {
        let _ = negotiated;
    }

    /// The handshake failed with `code` and `reason`.
    fn on_close(&mut self, code: CloseCode, reason: &str) {
        let _ = (code, reason);
    }
}

impl<O: HandshakeObserver + ?Sized> HandshakeObserver for &mut O {
    fn on_open(&mut self, negotiated: &Negotiated) {
        (**self).on_open(negotiated);
    }

    fn on_close(&mut self, code: CloseCode, reason: &str) {
        (**self).on_close(code, reason);
    }
}

/// Observer that ignores both signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl HandshakeObserver for NoopObserver {}
