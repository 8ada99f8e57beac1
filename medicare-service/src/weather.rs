use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::{ConfigError, WeatherError};

/// Thin client for the OpenWeatherMap current-weather endpoint.
#[derive(Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(config: &AppConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(config.retry.attempt_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
            api_key: config.weather_api_key().ok().map(str::to_string),
        })
    }

    pub fn request_url(&self, city: &str, api_key: &str) -> Result<Url, WeatherError> {
        Url::parse_with_params(
            &format!("{}/data/2.5/weather", self.base_url),
            &[("q", city), ("appid", api_key), ("units", "metric")],
        )
        .map_err(|e| WeatherError::InvalidUrl(e.to_string()))
    }

    /// Current weather for `city`, returned as the provider's raw JSON envelope.
    pub async fn fetch_weather(&self, city: &str) -> Result<Value, WeatherError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingKey(crate::config::WEATHER_API_KEY))?;
        let url = self.request_url(city, api_key)?;

        info!(city = %city, "Fetching current weather");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(city = %city, status = status.as_u16(), "Weather API request failed");
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

/// One-line description of a weather envelope, if it has the usual fields.
pub fn summarize_weather(city: &str, envelope: &Value) -> Option<String> {
    let description = envelope["weather"][0]["description"].as_str()?;
    let temperature = envelope["main"]["temp"].as_f64()?;
    let humidity = envelope["main"]["humidity"].as_f64()?;
    Some(format!(
        "Weather in {}: {}. Temperature: {}°C, Humidity: {}%.",
        city, description, temperature, humidity
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        routing::get,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    fn client(pairs: &[(&str, &str)]) -> WeatherClient {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WeatherClient::new(&AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()).unwrap()
    }

    /// Serves a fake `/data/2.5/weather` and returns its base URL.
    async fn fake_weather_api() -> String {
        async fn weather(
            Query(params): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
            if params.get("appid").map(String::as_str) != Some("good-key") {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"cod": 401, "message": "Invalid API key"})),
                ));
            }
            let city = params.get("q").cloned().unwrap_or_default();
            Ok(Json(json!({
                "name": city,
                "weather": [{"description": "light rain"}],
                "main": {"temp": 21.5, "humidity": 88},
                "units": params.get("units"),
            })))
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/data/2.5/weather", get(weather));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn request_url_encodes_city_and_uses_metric_units() {
        let client = client(&[("WEATHER_API_BASE_URL", "https://example.test/")]);
        let url = client.request_url("Bamenda Town", "k").unwrap();

        assert_eq!(
            url.as_str(),
            "https://example.test/data/2.5/weather?q=Bamenda+Town&appid=k&units=metric"
        );
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let err = client(&[]).fetch_weather("Bamenda").await.unwrap_err();
        assert!(matches!(
            err,
            WeatherError::Configuration(ConfigError::MissingKey("WEATHER_API_KEY"))
        ));
    }

    #[tokio::test]
    async fn returns_the_raw_envelope() {
        let base = fake_weather_api().await;
        let client = client(&[("WEATHER_API_BASE_URL", base.as_str()), ("WEATHER_API_KEY", "good-key")]);

        let envelope = client.fetch_weather("Bamenda").await.unwrap();
        assert_eq!(envelope["name"], "Bamenda");
        assert_eq!(envelope["units"], "metric");
        assert_eq!(
            summarize_weather("Bamenda", &envelope).as_deref(),
            Some("Weather in Bamenda: light rain. Temperature: 21.5°C, Humidity: 88%.")
        );
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let base = fake_weather_api().await;
        let client = client(&[("WEATHER_API_BASE_URL", base.as_str()), ("WEATHER_API_KEY", "bad-key")]);

        match client.fetch_weather("Douala").await.unwrap_err() {
            WeatherError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn summary_needs_the_usual_fields() {
        assert_eq!(summarize_weather("X", &json!({"cod": "404"})), None);
    }
}
