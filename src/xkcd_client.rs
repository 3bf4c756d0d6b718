use crate::configuration::Settings;
use log::{debug, error};
use std::time::Duration;

/// HTTP client for the xkcd API and image host.
///
/// Timeouts are the one transient failure class: they are retried
/// immediately, up to `max_retries` extra attempts, with no backoff.
/// Everything else (DNS failure, connection reset, non-2xx status) is
/// permanent for the request in question.
#[derive(Clone, Debug)]
pub struct XkcdClient {
    http: reqwest::Client,
    max_retries: u32,
}

impl XkcdClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            max_retries: settings.max_retries,
        })
    }

    /// Fetches a metadata document as text.
    ///
    /// Any failure is reported here, once, with the URL. Callers treat the
    /// error as "no data" and skip the comic, except for the latest-comic
    /// lookup where no work can proceed without it.
    pub async fn fetch_json(&self, url: &str) -> anyhow::Result<String> {
        match self.fetch_text(url).await {
            Ok(text) => Ok(text),
            Err(e) => {
                error!("Failed to fetch {}: {:#}", url, e);
                Err(e)
            }
        }
    }

    /// Fetches a binary body, typically a comic image.
    ///
    /// Same retry policy as [`fetch_json`](Self::fetch_json); reporting is
    /// left to the caller, which knows which comic the image belongs to.
    pub async fn fetch_bytes(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            let result = async {
                let response = self.http.get(url).send().await?.error_for_status()?;
                Ok::<_, reqwest::Error>(response.bytes().await?.to_vec())
            }
            .await;

            match result {
                Ok(body) => return Ok(body),
                Err(e) if e.is_timeout() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!("Timed out fetching {}, retry {}/{}", url, attempt, self.max_retries);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        let mut attempt = 0;
        loop {
            let result = async {
                let response = self.http.get(url).send().await?.error_for_status()?;
                response.text().await
            }
            .await;

            match result {
                Ok(text) => return Ok(text),
                Err(e) if e.is_timeout() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!("Timed out fetching {}, retry {}/{}", url, attempt, self.max_retries);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Whether an error from this client was a request timeout.
pub fn is_timeout(err: &anyhow::Error) -> bool {
    err.downcast_ref::<reqwest::Error>()
        .is_some_and(|e| e.is_timeout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_settings(timeout_secs: u64) -> Settings {
        Settings {
            api_base: String::new(),
            resource_name: "info.0.json".into(),
            worker_count: 4,
            request_timeout_secs: timeout_secs,
            max_retries: 3,
        }
    }

    #[tokio::test]
    async fn fetch_json_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"num":1}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = XkcdClient::new(&test_settings(5)).unwrap();
        let body = client
            .fetch_json(&format!("{}/info.0.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(r#"{"num":1}"#, body);
    }

    #[tokio::test]
    async fn http_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/404/info.0.json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = XkcdClient::new(&test_settings(5)).unwrap();
        let result = client
            .fetch_json(&format!("{}/404/info.0.json", server.uri()))
            .await;
        assert!(result.is_err());
        assert!(!is_timeout(&result.unwrap_err()));
    }

    #[tokio::test]
    async fn timeout_is_retried_until_exhausted() {
        let server = MockServer::start().await;
        // One original attempt plus three retries
        Mock::given(method("GET"))
            .and(path("/slow/info.0.json"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(60)),
            )
            .expect(4)
            .mount(&server)
            .await;

        let client = XkcdClient::new(&test_settings(1)).unwrap();
        let result = client
            .fetch_json(&format!("{}/slow/info.0.json", server.uri()))
            .await;
        assert!(is_timeout(&result.unwrap_err()));
    }
}
