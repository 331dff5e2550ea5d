//! A staged concurrent processing chain connected by bounded queues.
//!
//! Values fed into the chain flow through a sequence of independent stages,
//! each running on its own thread and connected to its neighbors by a
//! fixed-capacity FIFO queue. Closing the input propagates stage by stage
//! until every queue is closed and drained, and a background observer
//! periodically reports the occupancy of every queue without touching the
//! items themselves.
//!
//! # Features
//!
//! - Bounded blocking queues built on crossbeam channels
//! - One worker thread per stage, one-in one-out transforms
//! - Closure cascade shutdown: closing the input drains the whole chain
//! - Non-interfering queue occupancy observer with a one-shot stop signal
//! - Builder pattern for easy pipeline construction
//!
//! # Example
//!
//! ```ignore
//! use processing_chain::{DivisorStage, FinalizeStage, PipelineBuilder};
//!
//! let mut pipeline = PipelineBuilder::new()
//!     .add_stage(DivisorStage::new(3, "Fizz"))
//!     .add_stage(DivisorStage::new(5, "Buzz"))
//!     .add_stage(FinalizeStage)
//!     .assemble()?;
//!
//! pipeline.start_consuming(|item| println!("{}", item.annotation()));
//!
//! for i in 1..=100 {
//!     pipeline.feed(i)?;
//! }
//! pipeline.close()?;
//! pipeline.await_completion()?;
//! ```

pub mod error;
pub mod item;
pub mod observer;
pub mod pipeline;
pub mod queue;
pub mod stage;

// Re-exports for convenience
pub use error::{PipelineError, Result};
pub use item::Item;
pub use observer::{OccupancySample, QueueObserver, SampleHandle, StopHandle};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineState};
pub use queue::{bounded, QueueProbe, QueueReceiver, QueueSender};
pub use stage::{DivisorStage, FinalizeStage, FnStage, Stage, StageWorker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
