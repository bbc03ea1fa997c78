use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use tracing::{debug, error};

use crate::cancel::CancelToken;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::queue::{work_queue, Drain, Emitter};

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The producer and every consumer returned without raising the signal.
    Succeeded,
    /// Some stage failed (or panicked) and raised the cancellation signal.
    Cancelled,
}

impl Verdict {
    pub fn is_success(self) -> bool {
        self == Verdict::Succeeded
    }
}

/// Generic two-stage coordinator: one producer feeding `config.workers`
/// consumers through a queue of `config.queue_depth` slots.
///
/// # Run sequence
/// 1. Allocate the bounded queue and the shared [`CancelToken`].
/// 2. Start the producer and every consumer on scoped threads.
/// 3. When the producer returns its end of the queue is dropped, closing the
///    queue for insertion; queued items still drain.
/// 4. Join every consumer, then report [`Verdict::Cancelled`] if any stage
///    raised the signal.
///
/// Stage errors and panics never escape: each is logged at the task boundary
/// and converted into cancellation. Nothing is retried.
pub fn run_pipeline<T, P, C>(config: &PipelineConfig, produce: P, consume: C) -> Verdict
where
    T: Send,
    P: FnOnce(&Emitter<T>, &CancelToken) -> Result<(), PipelineError> + Send,
    C: Fn(T, &CancelToken) -> Result<(), PipelineError> + Sync,
{
    let cancel = CancelToken::new();
    let workers = config.workers.max(1);
    let (emitter, drain) = work_queue::<T>(config.queue_depth.max(1));

    debug!(workers, queue_depth = emitter.capacity(), "starting pipeline");

    thread::scope(|scope| {
        let cancel = &cancel;
        let consume = &consume;

        let producer = scope.spawn(move || {
            run_stage("producer", cancel, || produce(&emitter, cancel));
            // `emitter` is dropped here, closing the queue for insertion.
        });

        let consumers: Vec<_> = (0..workers)
            .map(|worker_id| {
                let drain = drain.clone();
                scope.spawn(move || {
                    run_stage("worker", cancel, || consume_loop(worker_id, drain, consume, cancel));
                })
            })
            .collect();
        drop(drain);

        if producer.join().is_err() {
            cancel.cancel();
        }
        for consumer in consumers {
            if consumer.join().is_err() {
                cancel.cancel();
            }
        }
    });

    if cancel.is_cancelled() {
        error!("processing was cancelled due to error");
        Verdict::Cancelled
    } else {
        Verdict::Succeeded
    }
}

/// Pull items until the queue is closed and empty or the signal is raised.
fn consume_loop<T, C>(
    worker_id: usize,
    drain: Drain<T>,
    consume: &C,
    cancel: &CancelToken,
) -> Result<(), PipelineError>
where
    C: Fn(T, &CancelToken) -> Result<(), PipelineError>,
{
    let mut handled = 0usize;
    while !cancel.is_cancelled() {
        let Some(item) = drain.pull() else { break };
        // Woken after another stage failed: drop the item without output.
        if cancel.is_cancelled() {
            break;
        }
        consume(item, cancel)?;
        handled += 1;
    }
    debug!(worker_id, handled, "worker stopped");
    Ok(())
}

/// Task boundary: run one stage, turning an error or a panic into cancellation.
fn run_stage<F>(stage: &'static str, cancel: &CancelToken, body: F)
where
    F: FnOnce() -> Result<(), PipelineError>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => {}
        // A closed queue only happens after the consumers stopped for an
        // earlier failure, which was already reported.
        Ok(Err(PipelineError::QueueClosed)) if cancel.is_cancelled() => {
            debug!(stage, "queue closed after cancellation");
        }
        Ok(Err(err)) => {
            error!(stage, "exception during processing: {err}");
            cancel.cancel();
        }
        Err(_) => {
            error!(stage, "stage panicked during processing");
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    fn config(workers: usize, queue_depth: usize) -> PipelineConfig {
        PipelineConfig::default()
            .with_workers(workers)
            .with_queue_depth(queue_depth)
    }

    #[test]
    fn every_item_is_consumed_exactly_once() {
        let seen = Mutex::new(Vec::new());
        let verdict = run_pipeline(
            &config(4, 3),
            |emitter, _| {
                for i in 0..100u32 {
                    emitter.emit(i)?;
                }
                Ok(())
            },
            |item, _| {
                seen.lock().unwrap().push(item);
                Ok(())
            },
        );
        assert_eq!(verdict, Verdict::Succeeded);
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn consumer_failure_releases_blocked_producer() {
        let emitted = AtomicUsize::new(0);
        let verdict = run_pipeline(
            &config(2, 1),
            |emitter, cancel| {
                for i in 0..10_000u32 {
                    if cancel.is_cancelled() {
                        break;
                    }
                    emitter.emit(i)?;
                    emitted.fetch_add(1, Ordering::Relaxed);
                }
                Ok(())
            },
            |_item: u32, _| Err(PipelineError::Format("injected".into())),
        );
        assert_eq!(verdict, Verdict::Cancelled);
        assert!(emitted.load(Ordering::Relaxed) < 10_000);
    }

    #[test]
    fn producer_failure_cancels_run() {
        let verdict = run_pipeline(
            &config(3, 2),
            |emitter, _| {
                emitter.emit(1u8)?;
                Err(PipelineError::Io(std::io::Error::other("disk gone")))
            },
            |_item, _| Ok(()),
        );
        assert_eq!(verdict, Verdict::Cancelled);
    }

    #[test]
    fn panicking_consumer_is_a_failure() {
        let verdict = run_pipeline(
            &config(2, 4),
            |emitter, _| {
                for i in 0..8u32 {
                    emitter.emit(i)?;
                }
                Ok(())
            },
            |item, _| {
                if item == 3 {
                    panic!("worker blew up");
                }
                Ok(())
            },
        );
        assert_eq!(verdict, Verdict::Cancelled);
    }

    #[test]
    fn empty_producer_succeeds() {
        let verdict = run_pipeline(&config(2, 2), |_: &Emitter<u8>, _| Ok(()), |_, _| Ok(()));
        assert!(verdict.is_success());
    }
}
