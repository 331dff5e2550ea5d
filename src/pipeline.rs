use crate::error::{PipelineError, Result};
use crate::item::Item;
use crate::observer::{OccupancySample, QueueObserver, SampleHandle, StopHandle};
use crate::queue::{bounded, QueueReceiver, QueueSender};
use crate::stage::{Stage, StageWorker};
use std::mem;
use std::thread::{spawn, JoinHandle};
use std::time::Duration;

const DEFAULT_QUEUE_CAPACITY: usize = 50;
const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_millis(500);

/// A stage slot in the pipeline builder
struct StageSlot {
    stage: Box<dyn Stage>,
    latency: Option<Duration>,
}

/// Builder for assembling pipelines
pub struct PipelineBuilder {
    stages: Vec<StageSlot>,
    queue_capacity: usize,
    sample_period: Duration,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sample_period: DEFAULT_SAMPLE_PERIOD,
        }
    }

    /// Set the capacity used for every queue in the chain
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the observer's sampling period
    pub fn sample_period(mut self, period: Duration) -> Self {
        self.sample_period = period;
        self
    }

    /// Append a stage to the chain
    pub fn add_stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(StageSlot {
            stage: Box::new(stage),
            latency: None,
        });
        self
    }

    /// Append a stage that sleeps `latency` per item, to make back-pressure
    /// visible to the observer
    pub fn add_stage_with_latency(mut self, stage: impl Stage, latency: Duration) -> Self {
        self.stages.push(StageSlot {
            stage: Box::new(stage),
            latency: Some(latency),
        });
        self
    }

    /// Assemble the pipeline: N+1 queues for N stages, one worker thread per
    /// stage wired input to output in sequence, plus the queue observer.
    ///
    /// Consumes the builder, so a pipeline is assembled exactly once.
    pub fn assemble(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(PipelineError::NoStages);
        }

        let (input, mut upstream) = bounded(self.queue_capacity);
        let mut probes = vec![upstream.probe()];
        let mut workers = Vec::with_capacity(self.stages.len());

        for slot in self.stages {
            let (tx, rx) = bounded(self.queue_capacity);
            probes.push(rx.probe());

            // This stage consumes the previous queue; the next one (or the
            // terminal consumer) takes over the queue created here.
            let stage_input = mem::replace(&mut upstream, rx);
            let mut worker = StageWorker::new(stage_input, tx);
            if let Some(latency) = slot.latency {
                worker = worker.with_latency(latency);
            }
            let stage = slot.stage;
            workers.push(spawn(move || worker.run(stage)));
        }

        let observer = QueueObserver::new(probes, self.sample_period);
        let samples = observer.sample_handle();
        let observer = Some(observer.spawn());

        Ok(Pipeline {
            input: Some(input),
            output: Some(upstream),
            workers,
            observer,
            samples,
            state: PipelineState::Assembled,
            consumer_started: false,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a pipeline instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Assembled, nothing fed yet
    Assembled,
    /// At least one item fed, input still open
    Feeding,
    /// Input closed, closure cascade in progress
    Closing,
    /// All stage and consumer threads joined, observer still running
    Drained,
    /// Observer joined; terminal state
    Stopped,
}

/// Handle onto an assembled chain of stage workers.
///
/// Feed any number of values, close exactly once, then await completion:
///
/// ```ignore
/// let mut pipeline = PipelineBuilder::new()
///     .add_stage(DivisorStage::new(3, "Fizz"))
///     .add_stage(FinalizeStage)
///     .assemble()?;
///
/// pipeline.start_consuming(|item| println!("{}", item.annotation()))?;
/// for i in 1..=100 {
///     pipeline.feed(i)?;
/// }
/// pipeline.close()?;
/// pipeline.await_completion()?;
/// ```
pub struct Pipeline {
    input: Option<QueueSender<Item>>,
    output: Option<QueueReceiver<Item>>,
    workers: Vec<JoinHandle<Result<()>>>,
    observer: Option<(StopHandle, JoinHandle<()>)>,
    samples: SampleHandle,
    state: PipelineState,
    consumer_started: bool,
}

impl Pipeline {
    /// Enqueue a value on the first queue, blocking while it is full
    pub fn feed(&mut self, value: i64) -> Result<()> {
        let input = match self.input.as_ref() {
            Some(input) => input,
            None => return Err(PipelineError::FeedAfterClose),
        };
        input
            .send(Item::new(value))
            .map_err(|_| PipelineError::ChannelClosed("input".to_string()))?;
        self.state = PipelineState::Feeding;
        Ok(())
    }

    /// Launch the terminal consumer: drains the last queue and applies
    /// `sink` to each item. Must be called before [`Pipeline::await_completion`].
    pub fn start_consuming<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(Item) + Send + 'static,
    {
        let output = self
            .output
            .take()
            .ok_or(PipelineError::ConsumerAlreadyStarted)?;
        self.workers.push(spawn(move || {
            while let Some(item) = output.recv() {
                sink(item);
            }
            Ok(())
        }));
        self.consumer_started = true;
        Ok(())
    }

    /// Close the first queue, triggering the closure cascade: each stage
    /// drains its input, closes its own output, and exits in turn.
    pub fn close(&mut self) -> Result<()> {
        let input = match self.input.take() {
            Some(input) => input,
            None => return Err(PipelineError::AlreadyClosed),
        };
        input.close();
        self.state = PipelineState::Closing;
        Ok(())
    }

    /// Block until every stage worker and the terminal consumer have
    /// finished, then stop and join the observer.
    ///
    /// No background thread outlives this call. The first stage failure, if
    /// any, is returned after teardown completes.
    pub fn await_completion(&mut self) -> Result<()> {
        if !self.consumer_started {
            return Err(PipelineError::ConsumerNotStarted);
        }
        if self.input.is_some() {
            return Err(PipelineError::NotClosed);
        }

        let mut first_err = None;
        for handle in self.workers.drain(..) {
            let result = handle
                .join()
                .unwrap_or_else(|_| Err(PipelineError::ThreadError("worker panicked".into())));
            if let Err(e) = result {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        self.state = PipelineState::Drained;

        if let Some((stop, handle)) = self.observer.take() {
            stop.stop();
            if handle.join().is_err() && first_err.is_none() {
                first_err = Some(PipelineError::ThreadError("observer panicked".into()));
            }
        }
        self.state = PipelineState::Stopped;

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The observer's most recent occupancy sample, if it has ticked yet
    pub fn last_occupancy(&self) -> Option<OccupancySample> {
        self.samples.latest()
    }
}
