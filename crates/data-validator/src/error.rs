//! Rejections raised while checking cycle inputs

use thiserror::Error;

/// Why a situation or a weather reading was rejected
///
/// Situation errors send threshold derivation to the base set; reading
/// errors only clear the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} = {value} outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0} is NaN or infinite")]
    NotFinite(&'static str),

    #[error("situation has a blank subject id")]
    BlankSubject,

    /// Index of the first forecast day not after its predecessor
    #[error("forecast day {index} is not after the previous day")]
    UnorderedForecast { index: usize },
}
