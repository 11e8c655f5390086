//! Stage combinators.
//!
//! Every stage spawns its tasks through the [`Pipeline`](crate::Pipeline), so all
//! of them stop on shutdown:
//!
//! - [`generate`] / [`generate_err`]: one producer task feeding a new conduit
//! - [`transform`] / [`transform_err`]: `n` workers mapping one conduit into another
//! - [`process`] / [`process_err`]: `n` workers draining a conduit into a sink
//! - [`collect`] / [`collect_err`]: one task aggregating into a oneshot
//!
//! Pools report success (closing their output or firing their signal) once every
//! worker has exited without error; reads cut short by cancellation count as a
//! clean exit. A worker error or a panic leaves the output open and the signal
//! pending, and the error arrives on the stage's error slot.

mod collect;
mod generate;
mod pool;
mod process;
mod transform;

pub use collect::{collect, collect_err};
pub use generate::{generate, generate_err, Writer};
pub use process::{process, process_err};
pub use transform::{transform, transform_err};
