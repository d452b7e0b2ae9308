//! Current-weather lookup performed once when a round starts.

use std::error::Error;

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;

use crate::state::round::Weather;

/// Failures of a weather lookup. Callers treat all of them as "no weather".
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provider could not be reached.
    #[error("weather provider unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The provider answered with a non-success status.
    #[error("weather provider returned status {0}")]
    Status(u16),
    /// The response carried no current conditions.
    #[error("weather response has no current conditions")]
    MissingCurrent,
}

/// Source of current conditions for a location.
pub trait WeatherProvider: Send + Sync {
    fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> BoxFuture<'static, Result<Weather, WeatherError>>;
}

/// Short description of a WMO weather interpretation code.
pub fn weather_code_description(code: i64) -> Option<&'static str> {
    let description = match code {
        0 => "Clear",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51 | 53 | 55 | 61 | 63 | 65 => "Rain",
        71 | 73 | 75 => "Snow",
        95 | 96 | 99 => "Thunderstorm",
        _ => return None,
    };
    Some(description)
}

/// Body of an Open-Meteo forecast response, restricted to what we request.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentConditions {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub weather_code: Option<i64>,
}

impl ForecastResponse {
    /// Convert to the round's weather record, tagging it with the request location.
    pub fn into_weather(self, latitude: f64, longitude: f64) -> Result<Weather, WeatherError> {
        let current = self.current.ok_or(WeatherError::MissingCurrent)?;
        Ok(Weather {
            temperature_c: current.temperature_2m,
            wind_mps: current.wind_speed_10m,
            code: current.weather_code,
            description: current
                .weather_code
                .and_then(weather_code_description)
                .map(str::to_owned),
            observed_at: current.time,
            latitude: Some(latitude),
            longitude: Some(longitude),
        })
    }
}

#[cfg(feature = "weather")]
pub use self::open_meteo::OpenMeteoClient;

#[cfg(feature = "weather")]
mod open_meteo {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use reqwest::Client;
    use tracing::debug;

    use super::{ForecastResponse, WeatherError, WeatherProvider};
    use crate::state::round::Weather;

    /// Open-Meteo forecast client; no API key is needed.
    #[derive(Clone)]
    pub struct OpenMeteoClient {
        client: Client,
        base_url: Arc<str>,
    }

    impl OpenMeteoClient {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
            let client = Client::builder().timeout(timeout).build().map_err(|source| {
                WeatherError::Unavailable {
                    message: "failed to build HTTP client".into(),
                    source: Box::new(source),
                }
            })?;
            Ok(Self {
                client,
                base_url: Arc::from(base_url.into()),
            })
        }

        async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Weather, WeatherError> {
            let query = [
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "current",
                    "temperature_2m,weather_code,wind_speed_10m".to_string(),
                ),
                ("wind_speed_unit", "ms".to_string()),
                ("timezone", "auto".to_string()),
            ];

            let response = self
                .client
                .get(self.base_url.as_ref())
                .query(&query)
                .send()
                .await
                .map_err(|source| WeatherError::Unavailable {
                    message: "request failed".into(),
                    source: Box::new(source),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(WeatherError::Status(status.as_u16()));
            }

            let body = response
                .json::<ForecastResponse>()
                .await
                .map_err(|source| WeatherError::Unavailable {
                    message: "failed to decode forecast".into(),
                    source: Box::new(source),
                })?;
            debug!(latitude, longitude, "fetched current weather");
            body.into_weather(latitude, longitude)
        }
    }

    impl WeatherProvider for OpenMeteoClient {
        fn current_weather(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> BoxFuture<'static, Result<Weather, WeatherError>> {
            let client = self.clone();
            Box::pin(async move { client.fetch(latitude, longitude).await })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_descriptions() {
        assert_eq!(weather_code_description(0), Some("Clear"));
        assert_eq!(weather_code_description(2), Some("Partly cloudy"));
        assert_eq!(weather_code_description(48), Some("Fog"));
        assert_eq!(weather_code_description(63), Some("Rain"));
        assert_eq!(weather_code_description(75), Some("Snow"));
        assert_eq!(weather_code_description(99), Some("Thunderstorm"));
        assert_eq!(weather_code_description(80), None);
    }

    #[test]
    fn forecast_converts_to_weather() {
        let body: ForecastResponse = serde_json::from_str(
            r#"{"current":{"time":"2025-06-01T14:30","temperature_2m":18.2,"wind_speed_10m":4.1,"weather_code":1}}"#,
        )
        .unwrap();
        let weather = body.into_weather(57.7, 11.97).unwrap();
        assert_eq!(weather.temperature_c, Some(18.2));
        assert_eq!(weather.description.as_deref(), Some("Partly cloudy"));
        assert_eq!(weather.observed_at.as_deref(), Some("2025-06-01T14:30"));
        assert_eq!(weather.latitude, Some(57.7));
    }

    #[test]
    fn forecast_without_current_is_an_error() {
        let body: ForecastResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            body.into_weather(0.0, 0.0),
            Err(WeatherError::MissingCurrent)
        ));
    }
}
