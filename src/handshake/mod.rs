//! Client opening handshake: classification, retry policy and the
//! controller that drives attempts over a transport.

pub mod classify;
pub mod controller;
pub mod observer;
pub mod outcome;
pub mod policy;
pub mod state;

pub use classify::{ClassifyContext, ResponseClassifier, verify_upgrade};
pub use controller::HandshakeController;
pub use observer::{HandshakeObserver, NoopObserver};
pub use outcome::{HandshakeOutcome, Negotiated, RetryDecision, Verdict};
pub use policy::{NoRetry, RetryPolicy, StandardRetryPolicy};
pub use state::HandshakeState;
