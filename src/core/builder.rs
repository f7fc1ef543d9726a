use std::sync::Arc;

use super::warden::Warden;
use crate::config::Config;
use crate::subscribers::Subscribe;

/// Builder for a [`Warden`] with event subscribers.
pub struct WardenBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl WardenBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the subscribers that receive every published event.
    ///
    /// Each subscriber gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the warden and starts its event listener.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Warden {
        Warden::with_subscribers(self.cfg, self.subscribers)
    }
}
