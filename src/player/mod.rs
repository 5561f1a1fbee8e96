//! Radio playback: queue scheduling and session control.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     PlaybackSession                             │
//! │   play / pause / next / previous, keeps the output loaded       │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │ cursor moves, QueueEvents
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      TrackScheduler                             │
//! │   QueueState + prefetch deficit, one generation batch at a time │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │ CompositionGate (FIFO, one holder)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Composer → AudioStore → Repository                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod cursor;
pub mod output;
mod queue;
mod scheduler;
mod session;

pub use cursor::PlaybackCursor;
pub use output::{LogOutput, PlaybackOutput, PlayerError};
pub use queue::{Advance, QueueState};
pub use scheduler::{
    DEFAULT_PREFETCH_THRESHOLD, GenerationError, QueueEvent, SchedulerSettings, TrackScheduler,
};
pub use session::PlaybackSession;
