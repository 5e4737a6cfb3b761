//! Scripted in-memory transport for connector tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};

use lw_protocol::CommandEnvelope;
use lw_transport::{FrameStream, Reply, SendFlags, Transport, TransportError, TransportResult};
use lw_types::Node;

pub(crate) enum Script {
    /// Answer with this frame (ignored for one-way sends).
    Reply(Bytes),
    /// Fail with a transport error.
    Fail,
    /// Never complete.
    Hang,
}

#[derive(Clone, Debug)]
pub(crate) struct Call {
    pub node: Node,
    pub command: String,
    pub data: Option<Value>,
    pub flags: SendFlags,
}

pub(crate) struct MockTransport {
    calls: Mutex<Vec<Call>>,
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    observers: Mutex<Vec<mpsc::Sender<TransportResult<Bytes>>>>,
    observer_count: watch::Sender<usize>,
    call_count: watch::Sender<usize>,
}

pub(crate) fn envelope(data_name: &str, data: Value) -> Bytes {
    Bytes::from(json!({ "dataName": data_name, "data": data }).to_string())
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            scripts: Mutex::new(HashMap::new()),
            observers: Mutex::new(Vec::new()),
            observer_count: watch::channel(0).0,
            call_count: watch::channel(0).0,
        })
    }

    pub fn script(&self, command: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(script);
    }

    pub fn reply(&self, command: &str, data_name: &str, data: Value) {
        self.script(command, Script::Reply(envelope(data_name, data)));
    }

    pub fn calls_for(&self, command: &str) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.command == command)
            .cloned()
            .collect()
    }

    /// Push a block notification to every open observer connection.
    pub fn push_block(&self, block: Value) {
        self.push_frame(envelope("block", block));
    }

    pub fn push_frame(&self, frame: Bytes) {
        let mut observers = self.observers.lock().unwrap();
        observers.retain(|tx| tx.try_send(Ok(frame.clone())).is_ok());
    }

    /// Drop every observer connection as if the node went away.
    pub fn drop_observers(&self) {
        self.observers.lock().unwrap().clear();
    }

    pub fn observers_closed(&self) -> bool {
        self.observers.lock().unwrap().iter().all(|tx| tx.is_closed())
    }

    /// Wait until `n` observer connections have been opened in total.
    pub async fn wait_observers(&self, n: usize) {
        let mut rx = self.observer_count.subscribe();
        rx.wait_for(|count| *count >= n).await.unwrap();
    }

    pub async fn wait_calls(&self, command: &str, n: usize) {
        let mut rx = self.call_count.subscribe();
        rx.wait_for(|_| self.calls_for(command).len() >= n).await.unwrap();
    }

    fn open_observer(&self, first: Bytes) -> Reply {
        let (tx, frames) = FrameStream::channel(64);
        self.observers.lock().unwrap().push(tx);
        self.observer_count.send_modify(|count| *count += 1);
        Reply::resident(first, frames)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, node: &Node, payload: Bytes, flags: SendFlags) -> TransportResult<Option<Reply>> {
        let envelope: CommandEnvelope = serde_json::from_slice(&payload).unwrap();
        self.calls.lock().unwrap().push(Call {
            node: node.clone(),
            command: envelope.command.clone(),
            data: envelope.data,
            flags,
        });
        self.call_count.send_modify(|count| *count += 1);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&envelope.command)
            .and_then(|queue| queue.pop_front());

        let frame = match script {
            Some(Script::Fail) => {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "scripted failure",
                )))
            }
            Some(Script::Hang) => return std::future::pending().await,
            Some(Script::Reply(frame)) => frame,
            None => Bytes::new(),
        };

        if flags.close_when_sent {
            return Ok(None);
        }
        if flags.close_when_received {
            return Ok(Some(Reply::single(frame)));
        }
        Ok(Some(self.open_observer(frame)))
    }
}
