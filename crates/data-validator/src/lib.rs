//! Data Validation
//!
//! Range checking for situational context and sanitization of weather
//! readings before they reach the threshold and alert stages.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{Validator, ValidationConfig, ValidationResult};
