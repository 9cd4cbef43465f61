//! Per-connection outbound queue and close signalling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::events::ServerEvent;

/// A frame queued for the connection's writer task.
#[derive(Debug)]
pub enum Outbound {
    Event(ServerEvent),
    /// Tells the writer to emit a Close frame and stop.
    Shutdown,
}

/// Handle to one participant's WebSocket, shared between the registry
/// and the connection task.
///
/// The socket itself lives in two per-connection tasks; the handle only
/// holds the sending halves of their control channels, so every
/// operation here is non-blocking and safe to call under the registry
/// lock.
pub struct ConnectionHandle {
    pub participant_id: String,
    pub session_id: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    close_tx: watch::Sender<bool>,
    closed: AtomicBool,
}

/// Receiver halves handed to the connection task at join time.
pub struct ConnectionDriver {
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
    pub close: watch::Receiver<bool>,
}

impl ConnectionHandle {
    pub fn new(participant_id: String, session_id: String) -> (Arc<Self>, ConnectionDriver) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = watch::channel(false);
        let handle = Arc::new(Self {
            participant_id,
            session_id,
            outbound: outbound_tx,
            close_tx,
            closed: AtomicBool::new(false),
        });
        let driver = ConnectionDriver {
            outbound: outbound_rx,
            close: close_rx,
        };
        (handle, driver)
    }

    /// Queue an event for delivery. Best-effort: a dead connection
    /// drops the event and the failure is only logged.
    pub fn send(&self, event: &ServerEvent) {
        if self.outbound.send(Outbound::Event(event.clone())).is_err() {
            tracing::debug!(
                participant_id = %self.participant_id,
                "event dropped: connection task gone"
            );
        }
    }

    /// Close the underlying stream. Idempotent: only the first call
    /// unblocks the receive loop and tells the writer to emit a Close
    /// frame.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.close_tx.send(true);
        let _ = self.outbound.send(Outbound::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_queues_event() {
        let (handle, mut driver) = ConnectionHandle::new("cli_a".to_string(), "ses_a".to_string());
        handle.send(&ServerEvent::ClientJoined {
            client_id: "cli_b".to_string(),
        });

        match driver.outbound.try_recv().unwrap() {
            Outbound::Event(ServerEvent::ClientJoined { client_id }) => {
                assert_eq!(client_id, "cli_b");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn close_is_idempotent() {
        let (handle, mut driver) = ConnectionHandle::new("cli_a".to_string(), "ses_a".to_string());
        assert!(!handle.is_closed());

        handle.close();
        handle.close();
        handle.close();

        assert!(handle.is_closed());
        assert!(*driver.close.borrow());

        let mut shutdowns = 0;
        while let Ok(frame) = driver.outbound.try_recv() {
            if matches!(frame, Outbound::Shutdown) {
                shutdowns += 1;
            }
        }
        assert_eq!(shutdowns, 1);
    }

    #[test]
    fn send_after_driver_dropped_is_silent() {
        let (handle, driver) = ConnectionHandle::new("cli_a".to_string(), "ses_a".to_string());
        drop(driver);
        // Must not panic or propagate anything.
        handle.send(&ServerEvent::ClientLeft {
            client_id: "cli_b".to_string(),
        });
        handle.close();
    }
}
