//! # Cancellable multi-stage pipelines for Rust
//!
//! This crate builds processing networks out of small stages connected by
//! bounded conduits, with one pipeline-wide cancellation and a shutdown that
//! waits for every spawned task to exit.
//!
//! ## Core Concepts
//!
//! - **Pipeline**: owns cancellation and tracks every task a stage spawns
//! - **Conduit**: bounded queue between stages; closes only when its owner says so
//! - **Oneshot**: write-once slot used for results and first errors
//! - **Signal**: fire-once broadcast used for completion
//! - **Stages**: `generate`, `transform`, `process`, `collect` and the multiplexers
//!   `wait_first`, `first`, `fan_in`, `read_err`
//!
//! ## Example
//!
//! ```rust
//! use stageweld::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let pp = Pipeline::new();
//!
//!     let numbers = generate(&pp, |w| async move {
//!         for k in 1..=100u64 {
//!             if !w.write(k).await {
//!                 return;
//!             }
//!         }
//!     });
//!     let doubled = transform(&pp, 4, numbers, |x| async move { x * 2 });
//!
//!     let reader = pp.clone();
//!     let total = collect(&pp, async move {
//!         let mut sum = 0;
//!         while let Some(x) = read(&reader, &doubled).await {
//!             sum += x;
//!         }
//!         sum
//!     });
//!
//!     assert_eq!(total.recv().await, Some(10_100));
//!     pp.shutdown().await;
//!     Ok(())
//! }
//! ```

#[macro_use]
mod tracing_support;

pub mod conduit;
pub mod error;
mod metrics;
pub mod multiplex;
pub mod oneshot;
pub mod pipeline;
pub mod signal;
pub mod stages;
pub mod task;
pub mod traits;
pub mod util;

// Re-export commonly used items
pub mod prelude {
    pub use crate::conduit::{conduit, read, write, Conduit, ConduitWriter};
    pub use crate::error::{Error, IntoStageError, Result};
    pub use crate::multiplex::{fan_in, first, first_err, read_err, wait_first};
    pub use crate::oneshot::{Oneshot, OneshotMut};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig};
    pub use crate::signal::{Signal, SignalMut};
    pub use crate::stages::{
        collect, collect_err, generate, generate_err, process, process_err, transform,
        transform_err, Writer,
    };
    pub use crate::task::{go, go_err, run, run_err};
    pub use crate::traits::Receive;
    pub use crate::util::CancellableExt;
}

pub use conduit::{conduit, read, write, Conduit, ConduitWriter, TryRecvError};
pub use error::{Error, Result};
pub use multiplex::{fan_in, first, first_err, read_err, wait_first};
pub use oneshot::{Oneshot, OneshotMut};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineConfig};
pub use signal::{Signal, SignalMut};
pub use stages::{
    collect, collect_err, generate, generate_err, process, process_err, transform,
    transform_err, Writer,
};
pub use task::{go, go_err, run, run_err};
pub use util::{Cancellable, CancellableExt};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
