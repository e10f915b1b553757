use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use super::{SeriesRequest, SeriesResponse, TimeseriesSource};

/// Acquisition gateway reached over HTTP.
///
/// POSTs the request batch as JSON to `<base_url>/data` and expects a JSON
/// array of `{ "name": ..., "data": { "Time": [...], "<tag>": [...] } }`.
#[derive(Clone)]
pub struct HttpTimeseriesSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTimeseriesSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "membrane-normalization/",
                env!("CARGO_PKG_VERSION")
            )),
        );
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn data_url(&self) -> String {
        format!("{}/data", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TimeseriesSource for HttpTimeseriesSource {
    async fn get_data(&self, requests: Vec<SeriesRequest>) -> Result<Vec<SeriesResponse>> {
        debug!(requests = requests.len(), url = %self.data_url(), "fetching timeseries");
        let resp = self
            .client
            .post(self.data_url())
            .json(&requests)
            .send()
            .await
            .context("timeseries POST failed")?;
        let status = resp.status();
        let body = resp.text().await.context("timeseries read failed")?;
        if !status.is_success() {
            anyhow::bail!("timeseries API error: HTTP {status}: {body}");
        }
        serde_json::from_str(&body).context("timeseries JSON parse failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SeriesRequest {
        let start = Utc.with_ymd_and_hms(2022, 9, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2022, 9, 1, 9, 10, 0).unwrap();
        SeriesRequest::new("normalization", "RO1", start, end).with_tag("FIT1", "TAG071")
    }

    #[tokio::test]
    async fn test_posts_requests_and_parses_tables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data"))
            .and(body_string_contains(r#""system_id":"RO1""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "normalization",
                "data": {
                    "Time": ["2022-09-01T09:00:00Z", "2022-09-01T09:05:00Z"],
                    "FIT1": [41.5, null]
                }
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpTimeseriesSource::new(server.uri(), Duration::from_secs(5)).unwrap();
        let responses = source.get_data(vec![request()]).await.unwrap();

        assert_eq!(responses.len(), 1);
        let data = &responses[0].data;
        assert_eq!(data.len(), 2);
        assert_eq!(data.column("FIT1").unwrap(), &[Some(41.5), None]);
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(503).set_body_string("influx down"))
            .mount(&server)
            .await;

        let source =
            HttpTimeseriesSource::new(format!("{}/", server.uri()), Duration::from_secs(5))
                .unwrap();
        let err = source.get_data(vec![request()]).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
        assert!(err.to_string().contains("influx down"));
    }

    #[tokio::test]
    async fn test_misaligned_table_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "normalization",
                "data": {
                    "Time": ["2022-09-01T09:00:00Z"],
                    "FIT1": [40.0, 41.0]
                }
            }])))
            .mount(&server)
            .await;

        let source = HttpTimeseriesSource::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = source.get_data(vec![request()]).await.unwrap_err();
        assert!(err.to_string().contains("timeseries JSON parse failed"));
        assert!(format!("{err:#}").contains("column FIT1 has 2 values for 1 timestamps"));
    }
}
