//! Route handlers

pub mod evaluate;
pub mod health;
