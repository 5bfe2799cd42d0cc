//! Shared agent core for the VLA camera-alignment bot: model-output interpretation, the
//! corpus record model, and corpus-scale diagnostics.
//!
//! The acting loop (capture, actuation, orchestration) lives outside this crate; what lives
//! here is every deterministic step between a raw model response and a typed verdict about
//! it, so the loop and the offline audit tooling share one implementation.

pub mod corpus;
pub mod service;
pub mod vla;
