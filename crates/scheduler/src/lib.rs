//! Clock-driven state machines for the showcase.
//!
//! Nothing in here owns a timer. Callers pass `Instant`s in, ask for the next
//! deadline, and sleep their event loop until then, which keeps both machines
//! deterministic under test.

mod cycle;
mod preload;

pub use cycle::{
    CycleController, CycleSettings, MAX_INTERVAL, MAX_TRANSITION, MIN_INTERVAL, MIN_TRANSITION,
};
pub use preload::{PreloadScheduler, PreloadSettings, PreloadTask};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("cannot cycle through an empty asset list")]
    EmptyCycle,
}
