//! API-Football client
//!
//! Fetches one endpoint at a time through a [`RetryPolicy`], separating
//! failures worth retrying (timeouts, 429s, 5xx) from structural ones
//! (malformed envelope, API-reported errors) that are returned at once.
//!
//! ## Response envelope
//!
//! ```json
//! { "errors": [], "results": 20, "response": [ ... ] }
//! ```

use super::retry::{Attempt, RetryError, RetryPolicy};
use super::transport::{HttpResponse, HttpTransport, Transport, TransportError};
use crate::config::ApiConfig;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// API endpoints the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Standings,
    TopScorers,
    TopAssists,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Standings => "/standings",
            Endpoint::TopScorers => "/players/topscorers",
            Endpoint::TopAssists => "/players/topassists",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{endpoint}: invalid API response structure: {reason}")]
    InvalidEnvelope { endpoint: String, reason: String },
    #[error("{endpoint}: API returned errors: {errors}")]
    Api { endpoint: String, errors: String },
    #[error("{endpoint}: all {attempts} attempts failed, last error: {last}")]
    Exhausted {
        endpoint: String,
        attempts: u32,
        last: String,
    },
}

/// Why a single request attempt failed
#[derive(Debug)]
enum RequestFailure {
    RateLimited,
    Transport(TransportError),
    Status(u16),
    Envelope(String),
    ApiErrors(Value),
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::RateLimited => write!(f, "HTTP 429 Too Many Requests"),
            RequestFailure::Transport(e) => write!(f, "{}", e),
            RequestFailure::Status(code) => write!(f, "HTTP {}", code),
            RequestFailure::Envelope(reason) => write!(f, "{}", reason),
            RequestFailure::ApiErrors(errors) => write!(f, "{}", errors),
        }
    }
}

pub struct ApiClient {
    transport: Box<dyn Transport>,
    base_url: String,
    league_id: u32,
    season: i32,
    policy: RetryPolicy,
}

impl ApiClient {
    /// Client talking to the real API over HTTPS
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.api_key, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Client over an arbitrary transport (used by tests)
    pub fn with_transport(config: &ApiConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            league_id: config.league_id,
            season: config.season,
            policy: RetryPolicy::new(
                config.max_retries,
                Duration::from_secs(config.backoff_base_secs),
                Duration::from_secs(config.rate_limit_cooldown_secs),
            ),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn league_id(&self) -> u32 {
        self.league_id
    }

    pub fn season(&self) -> i32 {
        self.season
    }

    /// `league` and `season` query parameters for the configured competition
    pub fn league_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("league", self.league_id.to_string()),
            ("season", self.season.to_string()),
        ]
    }

    /// Fetch an endpoint for the configured league and season
    pub async fn fetch_league(&self, endpoint: Endpoint) -> Result<Vec<Value>, FetchError> {
        self.fetch(endpoint, &self.league_params()).await
    }

    /// Fetch an endpoint and return the `response` array
    pub async fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let max_attempts = self.policy.max_attempts();

        let result = self
            .policy
            .run(endpoint.path(), |attempt| {
                log::info!(
                    "API Request: {} (Attempt {}/{})",
                    endpoint,
                    attempt + 1,
                    max_attempts
                );
                let request = self.transport.get(&url, params);
                async move { classify(request.await) }
            })
            .await;

        match result {
            Ok(records) => {
                log::info!("✓ API request successful: {} results", records.len());
                Ok(records)
            }
            Err(RetryError::Fatal(RequestFailure::ApiErrors(errors))) => Err(FetchError::Api {
                endpoint: endpoint.to_string(),
                errors: errors.to_string(),
            }),
            Err(RetryError::Fatal(failure)) => Err(FetchError::InvalidEnvelope {
                endpoint: endpoint.to_string(),
                reason: failure.to_string(),
            }),
            Err(RetryError::Exhausted { attempts, last }) => Err(FetchError::Exhausted {
                endpoint: endpoint.to_string(),
                attempts,
                last: last.to_string(),
            }),
        }
    }
}

fn classify(
    result: Result<HttpResponse, TransportError>,
) -> Result<Vec<Value>, Attempt<RequestFailure>> {
    let response = result.map_err(|e| Attempt::Transient(RequestFailure::Transport(e)))?;

    if response.status == 429 {
        return Err(Attempt::RateLimited(RequestFailure::RateLimited));
    }

    if !(200..300).contains(&response.status) {
        return Err(Attempt::Transient(RequestFailure::Status(response.status)));
    }

    let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
        Attempt::Fatal(RequestFailure::Envelope(format!("body is not valid JSON: {}", e)))
    })?;

    unwrap_envelope(payload).map_err(Attempt::Fatal)
}

fn unwrap_envelope(payload: Value) -> Result<Vec<Value>, RequestFailure> {
    let Value::Object(mut envelope) = payload else {
        return Err(RequestFailure::Envelope("payload is not a JSON object".to_string()));
    };

    let Some(records) = envelope.remove("response") else {
        return Err(RequestFailure::Envelope("missing 'response' field".to_string()));
    };

    if let Some(errors) = envelope.remove("errors") {
        if has_errors(&errors) {
            return Err(RequestFailure::ApiErrors(errors));
        }
    }

    match records {
        Value::Array(records) => Ok(records),
        other => Err(RequestFailure::Envelope(format!(
            "'response' is not an array: {}",
            other
        ))),
    }
}

/// The API reports "no errors" as `[]` or `{}`
fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Recorded = Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>;

    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Recorded,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<HttpResponse, TransportError>>) -> (Self, Recorded) {
            let requests: Recorded = Arc::new(Mutex::new(Vec::new()));
            let transport = Self {
                script: Mutex::new(script.into()),
                requests: requests.clone(),
            };
            (transport, requests)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(&str, String)],
        ) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".to_string())))
        }
    }

    fn test_config() -> ApiConfig {
        Config::from_lookup(
            |name| match name {
                "API_FOOTBALL_KEY" => Some("test-key".to_string()),
                "API_FOOTBALL_BASE_URL" => Some("http://api.test".to_string()),
                "SEASON" => Some("2024".to_string()),
                _ => None,
            },
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
        .api
    }

    fn client(script: Vec<Result<HttpResponse, TransportError>>) -> (ApiClient, Recorded) {
        let (transport, requests) = ScriptedTransport::new(script);
        let client = ApiClient::with_transport(&test_config(), Box::new(transport))
            .with_policy(RetryPolicy::new(3, Duration::ZERO, Duration::ZERO));
        (client, requests)
    }

    fn ok(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(200, body))
    }

    const VALID: &str = r#"{"errors": [], "results": 2, "response": [{"id": 1}, {"id": 2}]}"#;

    #[tokio::test]
    async fn test_fetch_success() {
        let (client, requests) = client(vec![ok(VALID)]);

        let records = client.fetch_league(Endpoint::Standings).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], 1);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://api.test/standings");
        assert_eq!(
            requests[0].1,
            vec![
                ("league".to_string(), "39".to_string()),
                ("season".to_string(), "2024".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let (client, requests) = client(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            ok(VALID),
        ]);

        let records = client.fetch_league(Endpoint::TopScorers).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_until_budget_exhausted() {
        let (client, requests) = client(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            ok(VALID),
        ]);

        let err = client.fetch_league(Endpoint::TopScorers).await.unwrap_err();

        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_timeouts_and_server_errors_are_retried() {
        let (client, requests) = client(vec![
            Err(TransportError::Timeout("10s elapsed".to_string())),
            Ok(HttpResponse::new(503, "unavailable")),
            ok(VALID),
        ]);

        let records = client.fetch_league(Endpoint::TopAssists).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_failures_exhaust() {
        let (client, _) = client(vec![
            Err(TransportError::Connection("refused".to_string())),
            Err(TransportError::Connection("refused".to_string())),
            Err(TransportError::Timeout("slow".to_string())),
        ]);

        let err = client.fetch_league(Endpoint::Standings).await.unwrap_err();

        match err {
            FetchError::Exhausted { endpoint, attempts, last } => {
                assert_eq!(endpoint, "/standings");
                assert_eq!(attempts, 3);
                assert!(last.contains("timed out"));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_response_field_not_retried() {
        let (client, requests) = client(vec![ok(r#"{"errors": []}"#), ok(VALID)]);

        let err = client.fetch_league(Endpoint::Standings).await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidEnvelope { .. }));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_api_errors_not_retried() {
        let (client, requests) = client(vec![
            ok(r#"{"errors": {"token": "Error/Missing application key."}, "response": []}"#),
            ok(VALID),
        ]);

        let err = client.fetch_league(Endpoint::Standings).await.unwrap_err();

        match err {
            FetchError::Api { errors, .. } => assert!(errors.contains("Missing application key")),
            other => panic!("expected API error, got {:?}", other),
        }
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_not_retried() {
        let (client, requests) = client(vec![ok("<html>oops</html>"), ok(VALID)]);

        let err = client.fetch_league(Endpoint::Standings).await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidEnvelope { .. }));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_error_shapes() {
        assert!(!has_errors(&serde_json::json!([])));
        assert!(!has_errors(&serde_json::json!({})));
        assert!(!has_errors(&Value::Null));
        assert!(has_errors(&serde_json::json!(["bad season"])));
        assert!(has_errors(&serde_json::json!({"season": "bad"})));
    }

    #[test]
    fn test_response_must_be_array() {
        let result = unwrap_envelope(serde_json::json!({"response": {"id": 1}}));
        assert!(matches!(result, Err(RequestFailure::Envelope(_))));

        let result = unwrap_envelope(serde_json::json!([1, 2]));
        assert!(matches!(result, Err(RequestFailure::Envelope(_))));

        let result = unwrap_envelope(serde_json::json!({"response": []})).unwrap();
        assert!(result.is_empty());
    }
}
