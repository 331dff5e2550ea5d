use crate::error::{PipelineError, Result};
use crate::item::Item;
use crate::queue::{QueueReceiver, QueueSender};
use std::thread;
use std::time::Duration;

/// Trait for one transform step in the chain.
///
/// A stage maps exactly one input item to one output item; filtering or
/// fan-out would corrupt downstream counts and is deliberately not supported.
pub trait Stage: Send + 'static {
    /// Transform one item. Failure is fatal to the whole run.
    fn apply(&mut self, item: Item) -> Result<Item>;

    /// Get a human-readable name for this stage
    fn name(&self) -> &str {
        "stage"
    }
}

/// Appends a label to the annotation of every item divisible by `divisor`
#[derive(Debug)]
pub struct DivisorStage {
    divisor: i64,
    label: String,
}

impl DivisorStage {
    /// Create a new divisor stage.
    ///
    /// # Panics
    ///
    /// Panics if `divisor` is zero.
    pub fn new(divisor: i64, label: impl Into<String>) -> Self {
        assert!(divisor != 0, "divisor must be non-zero");
        Self {
            divisor,
            label: label.into(),
        }
    }
}

impl Stage for DivisorStage {
    fn apply(&mut self, item: Item) -> Result<Item> {
        if item.value() % self.divisor == 0 {
            Ok(item.with_label(&self.label))
        } else {
            Ok(item)
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Terminal transform: items that reached the end of the chain without any
/// annotation get the string form of their value.
#[derive(Debug)]
pub struct FinalizeStage;

impl Stage for FinalizeStage {
    fn apply(&mut self, item: Item) -> Result<Item> {
        if item.annotation().is_empty() {
            Ok(item.with_annotation(item.value().to_string()))
        } else {
            Ok(item)
        }
    }

    fn name(&self) -> &str {
        "finalize"
    }
}

/// Adapter turning a plain closure into a stage
pub struct FnStage<F>
where
    F: FnMut(Item) -> Result<Item> + Send + 'static,
{
    name: String,
    transform: F,
}

impl<F> FnStage<F>
where
    F: FnMut(Item) -> Result<Item> + Send + 'static,
{
    /// Create a new closure-backed stage
    pub fn new(name: impl Into<String>, transform: F) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

impl<F> Stage for FnStage<F>
where
    F: FnMut(Item) -> Result<Item> + Send + 'static,
{
    fn apply(&mut self, item: Item) -> Result<Item> {
        (self.transform)(item)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Drives one stage: dequeue from the input queue, transform, enqueue on the
/// output queue, until the input is closed and drained.
pub struct StageWorker {
    input: QueueReceiver<Item>,
    output: QueueSender<Item>,
    latency: Option<Duration>,
}

impl StageWorker {
    /// Create a new stage worker over its input and output queues
    pub fn new(input: QueueReceiver<Item>, output: QueueSender<Item>) -> Self {
        Self {
            input,
            output,
            latency: None,
        }
    }

    /// Simulate per-item processing latency. Non-functional; used to make
    /// queue back-pressure visible to the observer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Run the stage to completion.
    ///
    /// Returns when the input queue reports closed-and-drained; the output
    /// sender is dropped on every exit path, which closes the downstream
    /// queue and propagates the closure cascade.
    pub fn run(self, mut stage: Box<dyn Stage>) -> Result<()> {
        while let Some(item) = self.input.recv() {
            if let Some(delay) = self.latency {
                thread::sleep(delay);
            }

            let produced = match stage.apply(item) {
                Ok(produced) => produced,
                Err(e) => {
                    // Fail fast: no replacement item is enqueued, the error
                    // surfaces through await_completion.
                    tracing::error!(stage = stage.name(), error = %e, "stage transform failed");
                    self.drain_input();
                    return Err(e);
                }
            };

            if self.output.send(produced).is_err() {
                self.drain_input();
                return Err(PipelineError::ChannelClosed(stage.name().to_string()));
            }
        }
        Ok(())
    }

    /// Discard the rest of the input after a fatal error. Upstream producers
    /// blocked on a full queue must not wedge on a stage that stopped
    /// forwarding; draining lets the closure cascade run to completion while
    /// the error propagates out of the join.
    fn drain_input(&self) {
        while self.input.recv().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::bounded;

    #[test]
    fn test_divisor_stage_appends_on_multiple() {
        let mut stage = DivisorStage::new(3, "Fizz");
        let out = stage.apply(Item::new(9)).unwrap();
        assert_eq!(out.annotation(), "Fizz");
    }

    #[test]
    fn test_divisor_stage_passes_through_otherwise() {
        let mut stage = DivisorStage::new(3, "Fizz");
        let out = stage.apply(Item::new(4)).unwrap();
        assert_eq!(out.annotation(), "");
        assert_eq!(out.value(), 4);
    }

    #[test]
    fn test_divisor_stages_accumulate() {
        let mut fizz = DivisorStage::new(3, "Fizz");
        let mut buzz = DivisorStage::new(5, "Buzz");
        let out = buzz.apply(fizz.apply(Item::new(15)).unwrap()).unwrap();
        assert_eq!(out.annotation(), "FizzBuzz");
    }

    #[test]
    fn test_finalize_stage_stringifies_unlabeled() {
        let mut stage = FinalizeStage;
        let out = stage.apply(Item::new(11)).unwrap();
        assert_eq!(out.annotation(), "11");
    }

    #[test]
    fn test_finalize_stage_keeps_existing_annotation() {
        let mut stage = FinalizeStage;
        let out = stage.apply(Item::new(3).with_label("Fizz")).unwrap();
        assert_eq!(out.annotation(), "Fizz");
    }

    #[test]
    fn test_fn_stage() {
        let mut stage = FnStage::new("tag", |item: Item| Ok(item.with_label("X")));
        let out = stage.apply(Item::new(1)).unwrap();
        assert_eq!(out.annotation(), "X");
    }

    #[test]
    fn test_worker_drains_input_and_closes_output() {
        let (in_tx, in_rx) = bounded(10);
        let (out_tx, out_rx) = bounded(10);
        let worker = StageWorker::new(in_rx, out_tx);

        let handle = thread::spawn(move || worker.run(Box::new(DivisorStage::new(2, "Even"))));

        for i in 1..=4 {
            in_tx.send(Item::new(i)).unwrap();
        }
        in_tx.close();

        let annotations: Vec<String> = std::iter::from_fn(|| out_rx.recv())
            .map(|item| item.annotation().to_string())
            .collect();
        assert_eq!(annotations, vec!["", "Even", "", "Even"]);
        // recv already returned None, so the worker closed its output
        handle.join().unwrap().unwrap();
    }

    #[test]
    #[should_panic(expected = "divisor must be non-zero")]
    fn test_divisor_stage_rejects_zero() {
        DivisorStage::new(0, "Never");
    }

    #[test]
    fn test_worker_drains_input_after_failure() {
        let (in_tx, in_rx) = bounded(1);
        let (out_tx, _out_rx) = bounded(1);
        let worker = StageWorker::new(in_rx, out_tx);

        let handle = thread::spawn(move || {
            worker.run(Box::new(FnStage::new("broken", |_| {
                Err(PipelineError::StageError("broken".into()))
            })))
        });

        // Capacity 1, so these sends block until the failed worker keeps
        // draining; a wedged worker would leave this loop stuck.
        for i in 1..=5 {
            in_tx.send(Item::new(i)).unwrap();
        }
        in_tx.close();

        assert!(matches!(
            handle.join().unwrap(),
            Err(PipelineError::StageError(_))
        ));
    }

    #[test]
    fn test_worker_stops_on_transform_failure() {
        let (in_tx, in_rx) = bounded(10);
        let (out_tx, out_rx) = bounded(10);
        let worker = StageWorker::new(in_rx, out_tx);

        let handle = thread::spawn(move || {
            worker.run(Box::new(FnStage::new("boom", |item: Item| {
                if item.value() == 2 {
                    Err(PipelineError::StageError("boom".into()))
                } else {
                    Ok(item)
                }
            })))
        });

        in_tx.send(Item::new(1)).unwrap();
        in_tx.send(Item::new(2)).unwrap();
        in_tx.close();

        assert!(matches!(
            handle.join().unwrap(),
            Err(PipelineError::StageError(_))
        ));
        // The failing item was not forwarded and the output is closed
        assert_eq!(out_rx.recv().unwrap().value(), 1);
        assert_eq!(out_rx.recv(), None);
    }
}
