//! In-memory transport that answers each request through a closure.

use std::collections::VecDeque;
use std::time::Duration;

use wsdial::transport::Transport;
use wsdial::{Error, Result};

/// One call made by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Dial { host: String, port: u16, secure: bool },
    Write(String),
    Read,
    Close,
}

/// How the scripted server answers one request.
#[derive(Debug)]
pub enum Reply {
    /// Raw response bytes; without a blank line the peer hangs up early.
    Bytes(Vec<u8>),
    /// The read fails with this error.
    Fail(Error),
    /// Nothing arrives until the read deadline passes.
    Hang,
}

type Responder = Box<dyn FnMut(&str) -> Reply + Send>;

pub struct ScriptedTransport {
    responder: Responder,
    dial_errors: VecDeque<Error>,
    reply: Option<Reply>,
    inbox: Vec<u8>,
    connected: bool,
    calls: Vec<Call>,
}

impl ScriptedTransport {
    pub fn new(responder: impl FnMut(&str) -> Reply + Send + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            dial_errors: VecDeque::new(),
            reply: None,
            inbox: Vec::new(),
            connected: false,
            calls: Vec::new(),
        }
    }

    /// Fail the next dial with `err`.
    pub fn fail_dial(mut self, err: Error) -> Self {
        self.dial_errors.push_back(err);
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn requests(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(req) => Some(req.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn dials(&self) -> Vec<(&str, u16)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Dial { host, port, .. } => Some((host.as_str(), *port)),
                _ => None,
            })
            .collect()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Bytes left unread after the last delimiter.
    pub fn leftover(&self) -> &[u8] {
        &self.inbox
    }
}

impl Transport for ScriptedTransport {
    async fn dial(&mut self, host: &str, port: u16, secure: bool, _timeout: Duration) -> Result<()> {
        self.calls.push(Call::Dial {
            host: host.to_string(),
            port,
            secure,
        });
        if let Some(err) = self.dial_errors.pop_front() {
            return Err(err);
        }
        self.connected = true;
        Ok(())
    }

    async fn write(&mut self, data: &[u8], _timeout: Duration) -> Result<()> {
        if !self.connected {
            return Err(Error::ConnectionClosed);
        }
        let request = String::from_utf8_lossy(data).into_owned();
        self.reply = Some((self.responder)(&request));
        self.calls.push(Call::Write(request));
        Ok(())
    }

    async fn read_until(&mut self, delimiter: &[u8], limit: usize, timeout: Duration) -> Result<Vec<u8>> {
        self.calls.push(Call::Read);
        match self.reply.take() {
            Some(Reply::Bytes(bytes)) => self.inbox.extend_from_slice(&bytes),
            Some(Reply::Fail(err)) => return Err(err),
            Some(Reply::Hang) => {
                tokio::time::sleep(timeout).await;
                return Err(Error::Timeout("read".into()));
            }
            None => {}
        }

        match self.inbox.windows(delimiter.len()).position(|w| w == delimiter) {
            Some(pos) if pos + delimiter.len() <= limit => {
                let rest = self.inbox.split_off(pos + delimiter.len());
                Ok(std::mem::replace(&mut self.inbox, rest))
            }
            Some(pos) => Err(Error::HandshakeTooLarge {
                size: pos + delimiter.len(),
                max: limit,
            }),
            None if self.inbox.len() >= limit => Err(Error::HandshakeTooLarge {
                size: self.inbox.len(),
                max: limit,
            }),
            None => Err(Error::ConnectionClosed),
        }
    }

    async fn close(&mut self) {
        self.calls.push(Call::Close);
        self.connected = false;
        self.inbox.clear();
        self.reply = None;
    }
}
