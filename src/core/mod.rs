//! Core datagen logic.

pub mod classifier;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod synth;
pub mod tags;
pub mod types;
