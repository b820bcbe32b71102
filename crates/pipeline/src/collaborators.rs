//! Input collaborators
//!
//! The engine never fetches data itself; these traits are implemented by
//! the services that own crop context and weather.

use crate::UpstreamError;
use field_model::{ForecastDay, Location, Situation, SubjectId, WeatherSnapshot};
use std::future::Future;

/// Current conditions and daily forecast for a location
pub trait WeatherSource: Send + Sync {
    fn get_weather(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<(WeatherSnapshot, Vec<ForecastDay>), UpstreamError>> + Send;
}

/// Crop, growth stage and history for a subject
pub trait CropContextProvider: Send + Sync {
    fn get_crop_context(
        &self,
        subject: &SubjectId,
    ) -> impl Future<Output = Result<Situation, UpstreamError>> + Send;
}
