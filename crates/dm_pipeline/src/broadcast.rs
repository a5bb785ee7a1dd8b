use async_trait::async_trait;
use dm_core::{BroadcastEvent, Broadcaster, Result};
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out over a tokio broadcast channel.
///
/// Publishing with no subscribers succeeds and reaches nobody.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn publish(&self, event: &BroadcastEvent) -> Result<usize> {
        match self.sender.send(event.clone()) {
            Ok(reached) => Ok(reached),
            Err(_) => {
                debug!("No subscribers for {}", event.event);
                Ok(0)
            }
        }
    }
}
