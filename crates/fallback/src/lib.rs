//! Rule-Based Fallback System
//!
//! Provides rule-based threshold strategies when model inference is
//! unavailable or not confident enough.

mod rules;

pub use rules::{
    CropProfileStrategy, DefaultStrategy, FallbackEngine, HealthStrategy, Proposal, ThresholdStrategy,
};
