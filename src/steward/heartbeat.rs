//! # Liveness channel.
//!
//! A heartbeat is a bounded queue of unit values. The ward owns the sending
//! half ([`Pulse`]); the supervisor reads the receiving half ([`Heartbeat`]).
//!
//! ## Rules
//! - **Never blocks**: [`Pulse::beat`] uses `try_send`; when the queue is full
//!   the beat is dropped. A full queue already proves liveness, so nothing is lost.
//! - **Termination signal**: once every `Pulse` clone is dropped (the ward's
//!   task exited), [`Heartbeat::recv`] returns `None`.

use tokio::sync::mpsc;

/// Creates a heartbeat queue holding at most `capacity` undelivered beats (min 1).
pub fn heartbeat(capacity: usize) -> (Pulse, Heartbeat) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Pulse { tx }, Heartbeat { rx })
}

/// Result of a single [`Pulse::beat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Beat {
    /// The beat was queued.
    Delivered,
    /// The queue was full; the beat was dropped.
    Dropped,
    /// Nobody listens anymore.
    Closed,
}

/// Sending half, owned by the monitored task.
#[derive(Clone, Debug)]
pub struct Pulse {
    tx: mpsc::Sender<()>,
}

impl Pulse {
    /// Emits one beat without waiting.
    pub fn beat(&self) -> Beat {
        match self.tx.try_send(()) {
            Ok(()) => Beat::Delivered,
            Err(mpsc::error::TrySendError::Full(())) => Beat::Dropped,
            Err(mpsc::error::TrySendError::Closed(())) => Beat::Closed,
        }
    }

    /// Returns true once the [`Heartbeat`] was dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, read by the supervisor.
#[derive(Debug)]
pub struct Heartbeat {
    rx: mpsc::Receiver<()>,
}

impl Heartbeat {
    /// Waits for the next beat; `None` once the ward dropped every [`Pulse`].
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Takes a queued beat if there is one.
    pub fn try_recv(&mut self) -> Option<()> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (pulse, mut hb) = heartbeat(1);
        assert_eq!(pulse.beat(), Beat::Delivered);
        assert_eq!(pulse.beat(), Beat::Dropped);
        assert_eq!(hb.recv().await, Some(()));
        assert_eq!(hb.try_recv(), None);
    }

    #[tokio::test]
    async fn dropping_every_pulse_closes_the_heartbeat() {
        let (pulse, mut hb) = heartbeat(4);
        let copy = pulse.clone();
        drop(pulse);
        assert_eq!(copy.beat(), Beat::Delivered);
        drop(copy);
        assert_eq!(hb.recv().await, Some(()));
        assert_eq!(hb.recv().await, None);
    }

    #[test]
    fn beat_after_listener_left_reports_closed() {
        let (pulse, hb) = heartbeat(1);
        drop(hb);
        assert!(pulse.is_closed());
        assert_eq!(pulse.beat(), Beat::Closed);
    }
}
