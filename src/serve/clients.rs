use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Payload sent to live reload clients after a rebuild.
pub const RELOAD_TOKEN: &str = "reload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSignal;

#[derive(Debug, Default)]
struct ClientMap {
    next_id: u64,
    clients: HashMap<u64, UnboundedSender<ReloadSignal>>,
}

/// Open live reload connections.
///
/// Each connection owns the receiving end of its own channel; broadcasting never waits on a
/// client.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry(Arc<Mutex<ClientMap>>);

impl ClientRegistry {
    pub fn new() -> Self {
        ClientRegistry::default()
    }

    /// Register a connection. Signals for it arrive on the returned receiver.
    pub fn connect(&self) -> (u64, UnboundedReceiver<ReloadSignal>) {
        let (tx, rx) = unbounded_channel();
        let mut map = self.0.lock();
        let id = map.next_id;
        map.next_id += 1;
        map.clients.insert(id, tx);
        tracing::debug!("Live reload client {id} connected");
        (id, rx)
    }

    pub fn disconnect(&self, id: u64) {
        if self.0.lock().clients.remove(&id).is_some() {
            tracing::debug!("Live reload client {id} disconnected");
        }
    }

    /// Signal every open connection. Returns how many were reached; connections whose receiver
    /// is gone are dropped.
    pub fn broadcast_reload(&self) -> usize {
        let mut map = self.0.lock();
        map.clients.retain(|_, tx| tx.send(ReloadSignal).is_ok());
        map.clients.len()
    }

    pub fn len(&self) -> usize {
        self.0.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
