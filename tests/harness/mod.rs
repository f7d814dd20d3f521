//! Test harness utilities for handshake testing.
//!
//! Provides a scripted in-memory transport, a throwaway TCP upgrade server
//! and helpers for building server responses from a captured request.

#![allow(dead_code)]

mod scripted;
mod server;

pub use scripted::{Call, Reply, ScriptedTransport};
pub use server::{Handler, TestServer, serve};

use wsdial::compute_accept_key;
use wsdial::handshake::HandshakeObserver;
use wsdial::{CloseCode, Negotiated};

/// Value of header `name` in a raw request, matched case-insensitively.
pub fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request.split("\r\n").skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

/// `Sec-WebSocket-Accept` matching the key in `request`.
pub fn accept_for(request: &str) -> String {
    compute_accept_key(header(request, "sec-websocket-key").unwrap_or_default())
}

/// A valid `101` answer to `request`, followed by `extra` headers.
pub fn switching(request: &str, extra: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         {extra}\r\n",
        accept_for(request)
    )
    .into_bytes()
}

pub fn status(line: &str, extra: &str) -> Vec<u8> {
    format!("HTTP/1.1 {line}\r\n{extra}\r\n").into_bytes()
}

/// Observer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(Negotiated),
    Close(CloseCode, String),
}

/// Observer that records every signal.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl HandshakeObserver for Recorder {
    fn on_open(&mut self, negotiated: &Negotiated) {
        self.events.push(Event::Open(negotiated.clone()));
    }

    fn on_close(&mut self, code: CloseCode, reason: &str) {
        self.events.push(Event::Close(code, reason.to_string()));
    }
}
