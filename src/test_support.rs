//! Test doubles shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, VdiffError};
use crate::http::{HttpClient, HttpResponse};
use crate::raster::{self, RasterImage};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Canned responses keyed by URL substring; unmatched URLs fail like a
/// refused connection.
#[derive(Debug, Default)]
pub struct MockHttp {
    routes: Vec<(String, HttpResponse)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, fragment: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((
            fragment.to_string(),
            HttpResponse {
                status,
                body: body.into(),
            },
        ));
        self
    }

    pub fn json(self, fragment: &str, status: u16, body: Value) -> Self {
        self.route(fragment, status, body.to_string())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(RecordedRequest {
                url: url.to_string(),
                headers: headers.to_vec(),
            });
        }
        self.routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| VdiffError::remote(None, format!("connection refused: {url}")))
    }
}

pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RasterImage::filled(width, height, rgba).expect("fixture image");
    raster::encode(&img).expect("encode fixture")
}
