//! FizzBuzzBazz over a staged concurrent chain.
//!
//! Labels 1..100 through divisor stages for 3, 5 and 7, with per-stage
//! latency proportional to the divisor so the observer's occupancy records
//! show back-pressure building up in the earlier queues.
//!
//! Usage: cargo run --example fizzbuzz --release
//!        (RUST_LOG=info to see the observer's occupancy records)

use processing_chain::{DivisorStage, FinalizeStage, PipelineBuilder};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const LATENCY_PER_DIVISOR: Duration = Duration::from_millis(20);

fn main() -> processing_chain::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pipeline = PipelineBuilder::new()
        .queue_capacity(50)
        .sample_period(Duration::from_millis(500))
        .add_stage_with_latency(DivisorStage::new(3, "Fizz"), 3 * LATENCY_PER_DIVISOR)
        .add_stage_with_latency(DivisorStage::new(5, "Buzz"), 5 * LATENCY_PER_DIVISOR)
        .add_stage_with_latency(DivisorStage::new(7, "Bazz"), 7 * LATENCY_PER_DIVISOR)
        .add_stage_with_latency(FinalizeStage, Duration::from_millis(10))
        .assemble()?;

    pipeline.start_consuming(|item| println!("{}", item.annotation()))?;

    for i in 1..=100 {
        pipeline.feed(i)?;
    }
    pipeline.close()?;
    pipeline.await_completion()
}
