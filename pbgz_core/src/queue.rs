use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::PipelineError;

/// Create a fixed-capacity FIFO between one producer and many consumers.
///
/// Dropping the [`Emitter`] closes the queue for insertion; items already
/// queued still drain. Dropping every [`Drain`] makes further emits fail,
/// which releases a producer blocked on a full queue.
pub fn work_queue<T>(capacity: usize) -> (Emitter<T>, Drain<T>) {
    let (tx, rx) = bounded(capacity);
    (Emitter { tx, capacity }, Drain { rx })
}

/// Producer end of the work queue.
pub struct Emitter<T> {
    tx: Sender<T>,
    capacity: usize,
}

impl<T> Emitter<T> {
    /// Push one item, blocking while the queue is full.
    pub fn emit(&self, item: T) -> Result<(), PipelineError> {
        self.tx.send(item).map_err(|_| PipelineError::QueueClosed)
    }

    /// Items produced but not yet pulled by a consumer.
    pub fn in_flight(&self) -> usize {
        self.tx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer end of the work queue. Cloned once per worker.
pub struct Drain<T> {
    rx: Receiver<T>,
}

impl<T> Drain<T> {
    /// Next item, blocking while the queue is empty but still open.
    /// Returns `None` once the queue is closed and empty.
    pub fn pull(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}

impl<T> Clone for Drain<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_queue_still_drains() {
        let (emitter, drain) = work_queue(4);
        emitter.emit(1u32).unwrap();
        emitter.emit(2u32).unwrap();
        assert_eq!(emitter.in_flight(), 2);
        drop(emitter);

        assert_eq!(drain.pull(), Some(1));
        assert_eq!(drain.pull(), Some(2));
        assert_eq!(drain.pull(), None);
    }

    #[test]
    fn emit_fails_once_all_consumers_are_gone() {
        let (emitter, drain) = work_queue::<u32>(1);
        let second = drain.clone();
        drop(drain);
        emitter.emit(1).unwrap();
        drop(second);
        assert!(matches!(emitter.emit(2), Err(PipelineError::QueueClosed)));
    }
}
