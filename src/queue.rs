use crossbeam::channel::{bounded as channel_bounded, Receiver, SendError, Sender};

/// Create a bounded FIFO queue with the given capacity, split into its
/// producer and consumer endpoints.
///
/// Each pipeline queue has exactly one producer and one consumer, which is
/// what makes the per-queue FIFO guarantee hold end to end.
pub fn bounded<T: Send>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = channel_bounded(capacity);
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer endpoint of a bounded queue
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: Sender<T>,
}

impl<T: Send> QueueSender<T> {
    /// Enqueue an item, blocking while the queue is at capacity.
    ///
    /// Returns the item back if the consumer side is gone, so the caller can
    /// decide how to surface the disconnect.
    pub fn send(&self, item: T) -> Result<(), T> {
        self.tx.send(item).map_err(|SendError(item)| item)
    }

    /// Close the queue. Consumes the sender, so enqueue-after-close is
    /// unrepresentable for the owning caller. Buffered items remain
    /// drainable; the consumer observes closed-and-empty exactly once.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Consumer endpoint of a bounded queue
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: Receiver<T>,
}

impl<T: Send> QueueReceiver<T> {
    /// Dequeue the next item, blocking while the queue is empty and open.
    ///
    /// Returns `None` exactly when the queue is closed and drained.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Number of currently buffered items. Non-blocking, best effort under
    /// concurrent access.
    pub fn occupancy(&self) -> usize {
        self.rx.len()
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.rx.capacity().unwrap_or(0)
    }

    /// A read-only occupancy view for the observer. The probe shares the
    /// underlying channel but exposes no way to dequeue.
    pub fn probe(&self) -> QueueProbe<T> {
        QueueProbe {
            rx: self.rx.clone(),
        }
    }
}

/// Read-only occupancy view of one queue, held by the observer
#[derive(Debug, Clone)]
pub struct QueueProbe<T> {
    rx: Receiver<T>,
}

impl<T: Send> QueueProbe<T> {
    /// Number of currently buffered items
    pub fn occupancy(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = bounded(10);
        for i in 0..5 {
            tx.send(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.recv(), Some(i));
        }
    }

    #[test]
    fn test_recv_none_after_close_and_drain() {
        let (tx, rx) = bounded(4);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        tx.close();
        assert_eq!(rx.recv(), Some(1));
        assert_eq!(rx.recv(), Some(2));
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_recv_none_on_empty_closed_queue() {
        let (tx, rx) = bounded::<i32>(4);
        tx.close();
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_occupancy_and_capacity() {
        let (tx, rx) = bounded(8);
        assert_eq!(rx.capacity(), 8);
        assert_eq!(rx.occupancy(), 0);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(rx.occupancy(), 2);
    }

    #[test]
    fn test_probe_does_not_consume() {
        let (tx, rx) = bounded(8);
        let probe = rx.probe();
        for i in 0..3 {
            tx.send(i).unwrap();
        }
        assert_eq!(probe.occupancy(), 3);
        tx.close();
        // Every item is still there for the real consumer
        assert_eq!(rx.recv(), Some(0));
        assert_eq!(rx.recv(), Some(1));
        assert_eq!(rx.recv(), Some(2));
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn test_send_returns_item_when_consumer_gone() {
        let (tx, rx) = bounded(2);
        drop(rx);
        assert_eq!(tx.send(9), Err(9));
    }

    #[test]
    fn test_send_blocks_until_space_frees() {
        let (tx, rx) = bounded(1);
        tx.send(1).unwrap();
        let producer = thread::spawn(move || tx.send(2));
        // The blocked send completes once the consumer makes room
        assert_eq!(rx.recv(), Some(1));
        producer.join().unwrap().unwrap();
        assert_eq!(rx.recv(), Some(2));
    }
}
