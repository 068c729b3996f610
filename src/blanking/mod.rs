//! The blanking decision core.
//!
//! [`state`] holds the pure transition rules; [`machine`] applies them to the
//! overlays and reports every change to the notification sink.

pub mod machine;
pub mod state;

pub use machine::BlankingMachine;
pub use state::{ActivationMode, BlankingTiming, DeactivationReason, Phase, Verdict, evaluate};
