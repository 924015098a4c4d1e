// [libs/infra/congress-client/src/client.rs]
/*!
 * APARATO: CONGRESS.GOV API CLIENT (ESTRATO L3)
 * RESPONSABILIDAD: Única puerta de salida hacia congress.gov v3. Aplica
 * espaciado entre peticiones, reintentos con backoff exponencial ante 429
 * y distingue explícitamente 404 ("este recurso no existe") de otros
 * códigos no exitosos ("algo falló, reintentar más tarde").
 */

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::FetchError;
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ActionsResponse, BillDetailResponse, BillListResponse, SubjectsResponse, SummariesResponse,
    TextResponse,
};

const BASE_URL: &str = "https://api.congress.gov/v3";

/// Presupuesto de reintentos y espaciado de un `CongressApiClient`,
/// inyectado desde el `Config` soberano del binario en vez de vivir
/// como constantes de módulo; permite que las pruebas construyan un
/// cliente con un backoff minúsculo sin tocar el contrato del Fetcher.
#[derive(Debug, Clone, Copy)]
pub struct FetcherTuning {
    pub inter_request_spacing: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for FetcherTuning {
    fn default() -> Self {
        Self {
            inter_request_spacing: Duration::from_millis(750),
            max_retries: 3,
            initial_backoff: Duration::from_secs(10),
        }
    }
}

/// Resultado de un intento de obtención de un sub-recurso. `NotFound`
/// está separado de `Failed` porque el primero es una respuesta
/// definitiva (el recurso no existe) y el segundo es transitorio
/// (se debe reintentar en una pasada posterior).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Ok(T),
    NotFound,
    Failed,
}

pub struct CongressApiClient {
    http: Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
    tuning: FetcherTuning,
}

impl CongressApiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_tuning(api_key, FetcherTuning::default())
    }

    pub fn with_tuning(api_key: impl Into<String>, tuning: FetcherTuning) -> Result<Self, FetchError> {
        Self::with_tuning_and_base_url(api_key, tuning, BASE_URL)
    }

    /// Seam used by tests to point the client at a `wiremock` server
    /// instead of the real congress.gov host; the retry/backoff state
    /// machine in `get_json` is otherwise identical.
    pub(crate) fn with_tuning_and_base_url(
        api_key: impl Into<String>,
        tuning: FetcherTuning,
        base_url: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("capitol-sync/0.1 (+legislative data ingestion)")
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.into(),
            limiter: RateLimiter::new(tuning.inter_request_spacing),
            tuning,
        })
    }

    /// `updated_since`, cuando se provee, debe ya venir formateado como
    /// ISO-8601 UTC sin milisegundos y con sufijo `Z` (p. ej.
    /// `2025-01-17T03:14:00Z`); este cliente no reformatea fechas.
    pub async fn list_bills(
        &self,
        congress: i32,
        bill_type: &str,
        offset: u32,
        limit: u32,
        updated_since: Option<&str>,
    ) -> Result<FetchOutcome<BillListResponse>, FetchError> {
        let path = format!("/bill/{congress}/{bill_type}");
        let mut query = vec![
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(from) = updated_since {
            query.push(("fromDateTime", from.to_string()));
            query.push(("sort", "updateDate desc".to_string()));
        }
        self.get_json(&path, &query, "bill list").await
    }

    pub async fn bill_detail(
        &self,
        congress: i32,
        bill_type: &str,
        bill_number: i32,
    ) -> Result<FetchOutcome<BillDetailResponse>, FetchError> {
        let path = format!("/bill/{congress}/{bill_type}/{bill_number}");
        self.get_json(&path, &[], "bill detail").await
    }

    pub async fn actions(
        &self,
        congress: i32,
        bill_type: &str,
        bill_number: i32,
    ) -> Result<FetchOutcome<ActionsResponse>, FetchError> {
        let path = format!("/bill/{congress}/{bill_type}/{bill_number}/actions");
        self.get_json(&path, &[], "actions").await
    }

    pub async fn subjects(
        &self,
        congress: i32,
        bill_type: &str,
        bill_number: i32,
    ) -> Result<FetchOutcome<SubjectsResponse>, FetchError> {
        let path = format!("/bill/{congress}/{bill_type}/{bill_number}/subjects");
        self.get_json(&path, &[], "subjects").await
    }

    pub async fn summaries(
        &self,
        congress: i32,
        bill_type: &str,
        bill_number: i32,
    ) -> Result<FetchOutcome<SummariesResponse>, FetchError> {
        let path = format!("/bill/{congress}/{bill_type}/{bill_number}/summaries");
        self.get_json(&path, &[], "summaries").await
    }

    pub async fn text(
        &self,
        congress: i32,
        bill_type: &str,
        bill_number: i32,
    ) -> Result<FetchOutcome<TextResponse>, FetchError> {
        let path = format!("/bill/{congress}/{bill_type}/{bill_number}/text");
        self.get_json(&path, &[], "text").await
    }

    /// Implementa el contrato completo de obtención: espaciado previo,
    /// reintento con backoff exponencial ante 429, paso directo de 404, y
    /// paso directo de cualquier otro código no exitoso. Las excepciones
    /// de red cuentan contra el mismo presupuesto de reintentos que un 429.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        label: &str,
    ) -> Result<FetchOutcome<T>, FetchError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = self.tuning.initial_backoff;
        let max_retries = self.tuning.max_retries;

        for attempt in 0..=max_retries {
            self.limiter.wait_turn().await;

            let response = self
                .http
                .get(&url)
                .query(query)
                .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
                .send()
                .await;

            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    if attempt == max_retries {
                        warn!(%label, %err, "NETWORK_FAULT: retry budget exhausted");
                        return Ok(FetchOutcome::Failed);
                    }
                    warn!(%label, %err, attempt, "NETWORK_FAULT: retrying after backoff");
                    sleep(backoff).await;
                    backoff *= 2;
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await?;
                    let parsed = serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                        label: label.to_string(),
                        source,
                    })?;
                    return Ok(FetchOutcome::Ok(parsed));
                }
                StatusCode::NOT_FOUND => {
                    debug!(%label, "NOT_FOUND: resource does not exist upstream");
                    return Ok(FetchOutcome::NotFound);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt == max_retries {
                        warn!(%label, "RATE_LIMIT_FAULT: retry budget exhausted");
                        return Ok(FetchOutcome::Failed);
                    }
                    warn!(%label, attempt, delay_secs = backoff.as_secs(), "RATE_LIMIT_FAULT: backing off");
                    sleep(backoff).await;
                    backoff *= 2;
                }
                other => {
                    warn!(%label, status = %other, "UPSTREAM_FAULT: non-success, not retrying");
                    return Ok(FetchOutcome::Failed);
                }
            }
        }

        Ok(FetchOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instant_tuning() -> FetcherTuning {
        FetcherTuning {
            inter_request_spacing: Duration::from_millis(1),
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    async fn test_client(server: &MockServer) -> CongressApiClient {
        CongressApiClient::with_tuning_and_base_url("test-key", instant_tuning(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn not_found_passes_through_without_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bill/119/hr/9999"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let outcome = client.bill_detail(119, "hr", 9999).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn rate_limit_retries_then_succeeds_within_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bill/119/hr/1"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bill/119/hr/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bill": {"title": "An Act", "introducedDate": "2025-01-01", "sponsors": []}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let outcome = client.bill_detail(119, "hr", 1).await.unwrap();
        match outcome {
            FetchOutcome::Ok(response) => assert_eq!(response.bill.title.as_deref(), Some("An Act")),
            other => panic!("expected a successful detail fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_exhausting_the_retry_budget_surfaces_as_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bill/119/hr/1"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let outcome = client.bill_detail(119, "hr", 1).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Failed));
    }

    #[tokio::test]
    async fn other_non_success_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bill/119/hr/1/actions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let outcome = client.actions(119, "hr", 1).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Failed));
    }

    #[tokio::test]
    async fn list_bills_with_updated_since_sends_the_expected_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bill/119/hr"))
            .and(query_param("fromDateTime", "2025-01-17T03:14:00Z"))
            .and(query_param("sort", "updateDate desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bills": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let outcome = client
            .list_bills(119, "hr", 0, 50, Some("2025-01-17T03:14:00Z"))
            .await
            .unwrap();
        match outcome {
            FetchOutcome::Ok(response) => assert!(response.bills.is_empty()),
            other => panic!("expected an empty but successful list response, got {other:?}"),
        }
    }
}
