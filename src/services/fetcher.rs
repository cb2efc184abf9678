// src/services/fetcher.rs

//! Image fetcher with bounded per-attempt time and bounded attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::services::retry::RetryPolicy;
use crate::utils::http;

/// A single GET against a remote host.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the body of `url`; non-success statuses are errors.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Retrieves image bytes, retrying failed attempts.
///
/// Running out of attempts is not an error: `fetch` returns `None` and the
/// caller decides what to skip.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            policy,
            timeout,
        }
    }

    /// Build an HTTP-backed fetcher from configuration.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Ok(Self::new(
            Arc::new(HttpTransport::new(client)),
            config.retry_policy(),
            config.timeout(),
        ))
    }

    /// Fetch `url` with this fetcher's policy and timeout.
    pub async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.fetch_with(url, &self.policy, self.timeout).await
    }

    /// Fetch `url`, making at most `policy.attempts()` attempts of at most
    /// `timeout` each.
    pub async fn fetch_with(
        &self,
        url: &str,
        policy: &RetryPolicy,
        timeout: Duration,
    ) -> Option<Vec<u8>> {
        let attempts = policy.attempts();

        for attempt in 1..=attempts {
            let outcome = match tokio::time::timeout(timeout, self.transport.get(url)).await {
                Ok(result) => result,
                // the elapsed future is dropped here, which cancels the request
                Err(_) => Err(AppError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                }),
            };

            match outcome {
                Ok(bytes) => return Some(bytes),
                Err(error) if attempt == attempts => {
                    log::error!("Failed to fetch {} after {} attempts: {}", url, attempts, error);
                }
                Err(error) => {
                    log::warn!("Retrying {} ({}/{}): {}", url, attempt, attempts, error);
                    let delay = policy.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Fails the first `failures` calls, then succeeds.
    struct FlakyTransport {
        calls: AtomicUsize,
        failures: usize,
    }

    impl FlakyTransport {
        fn new(failures: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures,
            }
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn get(&self, url: &str) -> Result<Vec<u8>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AppError::Status {
                    url: url.to_string(),
                    status: 503,
                })
            } else {
                Ok(b"image".to_vec())
            }
        }
    }

    /// Never completes.
    struct HangingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for HangingTransport {
        async fn get(&self, _url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    fn fetcher(transport: Arc<dyn Transport>, attempts: u32) -> Fetcher {
        Fetcher::new(
            transport,
            RetryPolicy::immediate(attempts),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn gives_up_after_exactly_max_attempts() {
        let transport = Arc::new(FlakyTransport::new(usize::MAX));
        let result = fetcher(transport.clone(), 3).fetch("https://x/a_1f600.png").await;
        assert!(result.is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let transport = Arc::new(FlakyTransport::new(2));
        let result = fetcher(transport.clone(), 3).fetch("https://x/a.png").await;
        assert_eq!(result.as_deref(), Some(&b"image"[..]));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let transport = Arc::new(FlakyTransport::new(0));
        let result = fetcher(transport.clone(), 5).fetch("https://x/a.png").await;
        assert!(result.is_some());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeouts_count_as_failed_attempts() {
        let transport = Arc::new(HangingTransport {
            calls: AtomicUsize::new(0),
        });
        let result = fetcher(transport.clone(), 2).fetch("https://x/a.png").await;
        assert!(result.is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    /// Serve `response` to every connection and count connections.
    async fn serve(response: &'static [u8]) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (format!("http://{}/thumbs/grinning-face_1f600.png", addr), hits)
    }

    #[tokio::test]
    async fn http_transport_retries_server_errors() {
        let (url, hits) = serve(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let client = Client::builder().build().unwrap();
        let fetcher = Fetcher::new(
            Arc::new(HttpTransport::new(client)),
            RetryPolicy::immediate(3),
            Duration::from_secs(5),
        );

        assert!(fetcher.fetch(&url).await.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn http_transport_returns_body() {
        let (url, hits) = serve(
            b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPNG!",
        )
        .await;

        let config = FetchConfig {
            timeout_secs: 5,
            ..FetchConfig::default()
        };
        let fetcher = Fetcher::from_config(&config).unwrap();

        assert_eq!(fetcher.fetch(&url).await.as_deref(), Some(&b"PNG!"[..]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
