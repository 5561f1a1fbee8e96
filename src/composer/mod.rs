//! Music composition - turns a station profile into generated audio.
//!
//! # Architecture
//!
//! - **Domain** (`domain.rs`) - plan types, audio stream alias, [`ComposeError`]
//! - **Plan** (`plan.rs`) - deterministic section/style plan for a station
//! - **Gate** (`gate.rs`) - single-holder FIFO gate in front of the composer
//! - **Client** (`client.rs`) - ElevenLabs music HTTP client
//! - **Traits** (`traits.rs`) - [`Composer`] seam so the scheduler can be tested
//!
//! # Usage
//!
//! ```ignore
//! let client = ElevenLabsClient::new(api_key);
//! let gate = CompositionGate::new();
//!
//! let plan = plan_for_station(&profile, DEFAULT_TRACK_DURATION_MS);
//! let _pass = gate.acquire().await?;
//! let audio = client.compose(&plan).await?;
//! ```

pub mod client;
pub mod domain;
pub mod gate;
pub mod plan;
pub mod traits;

pub use client::ElevenLabsClient;
pub use domain::{AudioStream, ComposeError, CompositionPlan, PlanSection};
pub use gate::{CompositionGate, GateClosed, GatePass};
pub use plan::{DEFAULT_TRACK_DURATION_MS, plan_for_station};
pub use traits::Composer;
