// [libs/infra/congress-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HTTP FETCHER (ESTRATO L3)
 * RESPONSABILIDAD: Cliente de bajo nivel contra congress.gov v3.
 * =================================================================
 */

mod client;
mod errors;
mod rate_limiter;
mod types;

pub use client::{CongressApiClient, FetchOutcome, FetcherTuning};
pub use errors::FetchError;
pub use types::{
    ActionDto, ActionsResponse, BillDetail, BillDetailResponse, BillListItem, BillListResponse,
    FormatDto, PolicyAreaDto, SourceSystemDto, SponsorDto, SubjectsDto, SubjectsResponse,
    SummariesResponse, SummaryDto, TextResponse, TextVersionDto,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Retry/backoff and status-code-handling coverage for the client
    // itself lives in `client.rs` against a `wiremock` server via the
    // `with_tuning_and_base_url` test seam. Here we only confirm the
    // wire-format decoding is as permissive as the rest of the pack.

    #[test]
    fn bill_list_response_ignores_unknown_fields() {
        let body = json!({
            "bills": [{"number": "1234", "updateDate": "2026-01-01", "extra": "ignored"}],
            "pagination": {"count": 1}
        });
        let parsed: BillListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.bills.len(), 1);
        assert_eq!(parsed.bills[0].number, "1234");
    }

    #[test]
    fn subjects_response_tolerates_missing_policy_area() {
        let body = json!({"subjects": {}});
        let parsed: SubjectsResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.subjects.policy_area.is_none());
    }

    #[tokio::test]
    async fn mock_server_round_trip_sanity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/bill/119/hr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bills": [{"number": "1", "updateDate": "2026-01-01"}]
            })))
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/v3/bill/119/hr", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let parsed: BillListResponse = response.json().await.unwrap();
        assert_eq!(parsed.bills.len(), 1);
    }
}
