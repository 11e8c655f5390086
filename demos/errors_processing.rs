//! A transform pool that hits a bad value; the first error stops the pipeline.
//!
//! Run with: cargo run --example errors_processing

use std::time::Duration;
use stageweld::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pp = Pipeline::builder().name("errors_processing").build();

    let seq = generate(&pp, |w| async move {
        for k in 0..100u64 {
            // Returns false on shutdown, so the loop never gets stuck.
            let _ = w.write(k).await;
        }
    });

    let (lines, errors) = transform_err(&pp, 5, seq, |x| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if x == 42 {
            return Err(Error::custom(format!("found strange number: {x}")));
        }
        Ok(format!("{x} -> {}", x | 17))
    });

    let finished = process(&pp, 2, lines, |line| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("{line}");
    });

    tokio::select! {
        Some(err) = errors.recv() => error!(%err, "stopping"),
        _ = finished.wait() => info!("finished!"),
    }

    info!("shutting down...");
    pp.shutdown().await;
    info!("done.");
}
