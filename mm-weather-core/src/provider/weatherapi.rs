use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, error, warn};

use super::{ProviderError, WeatherProvider};

pub const WEATHER_API_BASE: &str = "http://api.weatherapi.com/v1/current.json";

/// Client for the WeatherAPI.com current conditions endpoint.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, WEATHER_API_BASE)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

impl fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn fetch_weather(&self, location: &str) -> Result<Value, ProviderError> {
        debug!("Calling weather API for location: {location}");

        // The request URL carries the API key, so it is stripped from every error.
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location),
                ("aqi", "no"),
            ])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Call to weather API failed: {e}");
                ProviderError::Request(e)
            })?;

        let status = res.status();
        if !status.is_success() {
            warn!("Weather API responded with status {status}");
        }

        let body = res.bytes().await.map_err(|e| {
            let e = e.without_url();
            error!("Unable to extract body data from weather API response: {e}");
            ProviderError::Body(e)
        })?;

        // Anything other than a JSON object is rejected.
        let doc = serde_json::from_slice::<Map<String, Value>>(&body)
            .map(Value::Object)
            .map_err(|e| {
                error!("Failed to convert weather API body data: {e}");
                ProviderError::Decode(e)
            })?;

        debug!("Weather data: {doc}");

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn provider_for(server: &MockServer) -> WeatherApiProvider {
        WeatherApiProvider::with_base_url(
            "TEST_KEY".into(),
            format!("{}/v1/current.json", server.uri()),
        )
    }

    #[tokio::test]
    async fn sends_key_location_and_aqi_suffix() {
        let server = MockServer::start().await;
        let body = json!({"location": {"name": "Paris"}, "current": {"temp_c": 21.5}});

        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "TEST_KEY"))
            .and(query_param("q", "Paris"))
            .and(query_param("aqi", "no"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let doc = provider_for(&server).fetch_weather("Paris").await.unwrap();
        assert_eq!(doc, body);
    }

    #[tokio::test]
    async fn reserved_characters_are_encoded_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("q", "New York,US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        provider_for(&server).fetch_weather("New York,US").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(query.contains("q=New+York%2CUS"), "query was {query}");
    }

    #[tokio::test]
    async fn non_success_status_still_returns_body() {
        let server = MockServer::start().await;
        let body = json!({"error": {"code": 1006, "message": "No matching location found."}});

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let doc = provider_for(&server).fetch_weather("Nowhere").await.unwrap();
        assert_eq!(doc, body);
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch_weather("Paris").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_error_hides_api_key() {
        // Nothing listens on a port whose listener has been dropped.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let base = format!("http://127.0.0.1:{port}/v1/current.json");

        let provider = WeatherApiProvider::with_base_url("SECRET_KEY".into(), base);
        let err = provider.fetch_weather("Paris").await.unwrap_err();

        assert!(matches!(err, ProviderError::Request(_)));
        assert!(!err.to_string().contains("SECRET_KEY"));
    }

    #[tokio::test]
    async fn non_object_body_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch_weather("Paris").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        assert!(err.to_string().starts_with("failed to decode weather API response"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let provider = WeatherApiProvider::new("SECRET_KEY".into());
        assert!(!format!("{provider:?}").contains("SECRET_KEY"));
    }
}
