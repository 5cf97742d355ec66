//! Success envelope shared by the tour endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::middleware::request_time::RequestTime;

/// `{status: "success", responseTime?, requestTime?, results?, data}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status: &'static str,

    /// Milliseconds between arrival and response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,

    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            response_time: None,
            request_time: None,
            results: None,
            data,
        }
    }

    pub fn with_response_time(mut self, time: &RequestTime) -> Self {
        self.response_time = Some(time.elapsed_ms());
        self
    }

    pub fn with_request_time(mut self, time: &RequestTime) -> Self {
        self.request_time = Some(time.at());
        self
    }

    pub fn with_results(mut self, results: usize) -> Self {
        self.results = Some(results);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_members_are_omitted() {
        let json = serde_json::to_value(Envelope::success(json!({ "stats": [] }))).unwrap();
        assert_eq!(json, json!({ "status": "success", "data": { "stats": [] } }));
    }

    #[test]
    fn test_timing_members() {
        let time = RequestTime::now();
        let json = serde_json::to_value(
            Envelope::success(json!({}))
                .with_response_time(&time)
                .with_request_time(&time)
                .with_results(3),
        )
        .unwrap();

        assert!(json["responseTime"].is_u64());
        assert!(json["requestTime"].is_string());
        assert_eq!(json["results"], 3);
    }
}
