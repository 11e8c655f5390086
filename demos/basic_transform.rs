//! Generator, parallel transform and a sink, with a bounded wait for completion.
//!
//! Run with: cargo run --example basic_transform

use std::time::Duration;
use stageweld::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Squared {
    x: u64,
    y: u64,
}

fn sequence(pp: &Pipeline, count: u64) -> Conduit<u64> {
    generate(pp, move |w| async move {
        for k in 0..count {
            if !w.write(k).await {
                return;
            }
        }
    })
}

fn square(pp: &Pipeline, workers: usize, nums: Conduit<u64>) -> Conduit<Squared> {
    transform(pp, workers, nums, |x| async move {
        info!(x, "square started");
        tokio::time::sleep(Duration::from_millis(500)).await;
        info!(x, "square finished");
        Squared { x, y: x * x }
    })
}

fn print_nums(pp: &Pipeline, input: Conduit<Squared>) -> Signal {
    process(pp, 1, input, |r| async move {
        info!(x = r.x, y = r.y, "processed");
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pp = Pipeline::builder().name("basic_transform").build();

    let nums = sequence(&pp, 20);
    let squares = square(&pp, 4, nums);
    let finished = print_nums(&pp, squares);

    if !finished.wait_for(Duration::from_secs(2)).await {
        warn!("timeout!");
    }

    info!("shutting down...");
    pp.shutdown().await;
    info!("done.");
}
