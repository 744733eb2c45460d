use super::types::Mensaje;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// Fans new chat messages out to live subscribers in this process.
///
/// Subscribers receive every message and keep the ones for the conversation
/// they follow. A slow subscriber that falls more than the channel capacity
/// behind loses the oldest messages and can reload the history instead.
#[derive(Clone, Debug)]
pub struct ChatHub {
    sender: broadcast::Sender<Mensaje>,
}

impl ChatHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, mensaje: &Mensaje) {
        // No receivers just means nobody is watching right now.
        let receivers = self.sender.send(mensaje.clone()).unwrap_or(0);
        trace!(conversacion = %mensaje.conversacion_id, receivers, "Published chat message");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Mensaje> {
        self.sender.subscribe()
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
