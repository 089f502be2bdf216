//! Minimal HTTP capability used by the reference resolver.
//!
//! The resolver only ever issues `GET` requests, so the seam is a single
//! async method. [`ReqwestHttp`] is the production implementation; tests
//! substitute their own.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::error::{Result, VdiffError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET request. Transport failures are errors; any HTTP status
    /// (including 4xx/5xx) is returned as a response.
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        (**self).get(url, headers).await
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    client: Client,
}

impl ReqwestHttp {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(VdiffError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttp {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| VdiffError::Config(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| VdiffError::Config(format!("invalid value for header {name}")))?;
            map.insert(name, value);
        }

        let response = self.client.get(url).headers(map).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Await `fut`, failing with [`VdiffError::Timeout`] once `after` elapses.
pub async fn with_deadline<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(VdiffError::Timeout { operation, after }),
    }
}
