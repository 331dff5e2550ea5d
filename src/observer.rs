use crate::queue::QueueProbe;
use crossbeam::channel::{bounded, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One occupancy reading across every queue in the chain, in queue order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancySample {
    pub occupancies: Vec<usize>,
}

impl OccupancySample {
    /// Format the sample as a human-readable string
    pub fn format(&self) -> String {
        let counts: Vec<String> = self.occupancies.iter().map(|c| c.to_string()).collect();
        format!("queues: [{}]", counts.join(" "))
    }
}

/// Shared handle onto the most recent sample the observer published
#[derive(Debug, Clone)]
pub struct SampleHandle {
    latest: Arc<Mutex<Option<OccupancySample>>>,
}

impl SampleHandle {
    /// The most recent sample, if the observer has ticked at least once
    pub fn latest(&self) -> Option<OccupancySample> {
        self.latest.lock().clone()
    }
}

/// Single-use stop signal for the observer.
///
/// Backed by a zero-capacity rendezvous channel: the send completes only once
/// the observer has actually received it, so stopping doubles as the
/// acknowledgment.
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Signal the observer to stop. If the observer already exited the send
    /// fails silently, which is fine: either way it is no longer running.
    pub fn stop(self) {
        let _ = self.tx.send(());
    }
}

/// Background task that periodically samples the occupancy of every queue it
/// was given, until told to stop.
///
/// Strictly a non-interfering monitor: probes expose occupancy counts only,
/// never the items themselves.
pub struct QueueObserver<T: Send + 'static> {
    probes: Vec<QueueProbe<T>>,
    period: Duration,
    latest: Arc<Mutex<Option<OccupancySample>>>,
}

impl<T: Send + 'static> QueueObserver<T> {
    /// Create an observer over an ordered list of queue probes
    pub fn new(probes: Vec<QueueProbe<T>>, period: Duration) -> Self {
        Self {
            probes,
            period,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for reading the most recently published sample
    pub fn sample_handle(&self) -> SampleHandle {
        SampleHandle {
            latest: Arc::clone(&self.latest),
        }
    }

    /// Spawn the sampling thread. The observer exits on the stop signal
    /// without waiting out the current period.
    pub fn spawn(self) -> (StopHandle, JoinHandle<()>) {
        let (tx, rx) = bounded(0);
        let handle = thread::spawn(move || self.run(rx));
        (StopHandle { tx }, handle)
    }

    fn run(self, stop: Receiver<()>) {
        let ticker = tick(self.period);
        loop {
            // Wait on the stop signal and the next tick simultaneously.
            // A dropped stop sender also terminates the loop.
            crossbeam::select! {
                recv(stop) -> _ => break,
                recv(ticker) -> _ => {
                    let sample = self.take_sample();
                    tracing::info!(target: "processing_chain::observer", "{}", sample.format());
                    *self.latest.lock() = Some(sample);
                }
            }
        }
    }

    fn take_sample(&self) -> OccupancySample {
        OccupancySample {
            occupancies: self.probes.iter().map(|p| p.occupancy()).collect(),
        }
    }
}
