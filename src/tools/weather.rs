use super::Tool;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::{schemas::Validator, AgentError};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const MAX_FORECAST_DAYS: u8 = 16;

/// Parameters for weather queries
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WeatherParams {
    pub location: String,
    #[serde(default)]
    pub days: Option<u8>,
    #[serde(default)]
    pub units: Option<TemperatureUnits>,
}

/// Temperature units
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnits {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnits {
    fn symbol(self) -> &'static str {
        match self {
            TemperatureUnits::Celsius => "°C",
            TemperatureUnits::Fahrenheit => "°F",
        }
    }

    fn query_value(self) -> &'static str {
        match self {
            TemperatureUnits::Celsius => "celsius",
            TemperatureUnits::Fahrenheit => "fahrenheit",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub units: String,
    pub days: Vec<DailyForecast>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodedPlace>,
}

#[derive(Debug, Deserialize)]
struct GeocodedPlace {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

/// Daily forecast for a named place, backed by the Open-Meteo APIs
#[derive(Debug, Clone)]
pub struct WeatherTool {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherTool {
    pub fn new() -> Self {
        Self::with_endpoints(GEOCODING_URL, FORECAST_URL)
    }

    pub fn with_endpoints(geocoding_url: impl Into<String>, forecast_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn geocode(&self, location: &str) -> Result<GeocodedPlace, AgentError> {
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[("name", location), ("count", "1"), ("format", "json")])
            .send()
            .await
            .map_err(|err| AgentError::ToolExecution(format!("Geocoding request failed: {}", err)))?;

        if !response.status().is_success() {
            return Err(AgentError::ToolExecution(format!(
                "Geocoding returned status {}",
                response.status()
            )));
        }

        let body: GeocodingResponse = response.json().await.map_err(|err| {
            AgentError::ToolExecution(format!("Failed to read geocoding response: {}", err))
        })?;

        body.results.into_iter().next().ok_or_else(|| {
            AgentError::ToolExecution(format!("No place found for `{}`", location))
        })
    }

    async fn forecast(
        &self,
        place: &GeocodedPlace,
        days: u8,
        units: TemperatureUnits,
    ) -> Result<DailySeries, AgentError> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
                ),
                ("timezone", "auto".to_string()),
                ("forecast_days", days.to_string()),
                ("temperature_unit", units.query_value().to_string()),
            ])
            .send()
            .await
            .map_err(|err| AgentError::ToolExecution(format!("Forecast request failed: {}", err)))?;

        if !response.status().is_success() {
            return Err(AgentError::ToolExecution(format!(
                "Forecast returned status {}",
                response.status()
            )));
        }

        let body: ForecastResponse = response.json().await.map_err(|err| {
            AgentError::ToolExecution(format!("Failed to read forecast response: {}", err))
        })?;
        Ok(body.daily)
    }
}

impl Tool for WeatherTool {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn description(&self) -> &'static str {
        "Daily weather forecast (max/min temperature, precipitation) for a city, up to 16 days ahead"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "City name, e.g. Paris"},
                "days": {
                    "type": "integer",
                    "description": "Number of forecast days (1-16, default 7)"
                },
                "units": {
                    "type": "string",
                    "enum": ["celsius", "fahrenheit"]
                }
            },
            "required": ["location"]
        })
    }

    fn execute(
        &self,
        parameters: Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Value, AgentError>> + Send + '_>> {
        Box::pin(async move {
            let params: WeatherParams = Validator::SerdeFirst.validate(parameters)?;
            let units = params.units.unwrap_or_default();
            let days = params.days.unwrap_or(7).clamp(1, MAX_FORECAST_DAYS);

            let place = self.geocode(&params.location).await?;
            let series = self.forecast(&place, days, units).await?;

            let forecast = WeatherForecast {
                location: place.name.clone(),
                country: place.country.clone(),
                latitude: place.latitude,
                longitude: place.longitude,
                units: units.symbol().to_string(),
                days: zip_series(series),
            };

            serde_json::to_value(forecast).map_err(|e| {
                AgentError::ToolExecution(format!("Failed to serialize result: {}", e))
            })
        })
    }
}

fn zip_series(series: DailySeries) -> Vec<DailyForecast> {
    series
        .time
        .into_iter()
        .enumerate()
        .map(|(idx, date)| DailyForecast {
            date,
            temperature_max: series.temperature_2m_max.get(idx).copied().flatten(),
            temperature_min: series.temperature_2m_min.get(idx).copied().flatten(),
            precipitation_mm: series.precipitation_sum.get(idx).copied().flatten(),
        })
        .collect()
}
