//! Resolves a design reference into dimensions and a downloaded raster export.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::api_types::{ImagesResponse, NodesResponse, EXPORT_FORMAT};
use super::auth::FigmaAuth;
use super::link::DesignReference;
use crate::config::Timeouts;
use crate::error::{Result, VdiffError};
use crate::http::{with_deadline, HttpClient, HttpResponse};
use crate::raster;
use crate::Viewport;

pub const DEFAULT_API_BASE: &str = "https://api.figma.com/v1";

/// Largest export scale the design service accepts.
pub const MAX_EXPORT_SCALE: f32 = 4.0;

/// Canonical size and export location of one design node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignExport {
    pub dimensions: Viewport,
    pub image_url: String,
}

#[derive(Debug)]
pub struct ReferenceResolver<H> {
    http: H,
    auth: Option<FigmaAuth>,
    base_url: Url,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl<H: HttpClient> ReferenceResolver<H> {
    pub fn new(http: H, auth: Option<FigmaAuth>) -> Result<Self> {
        Self::with_base_url(http, auth, DEFAULT_API_BASE)
    }

    pub fn with_base_url(http: H, auth: Option<FigmaAuth>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| VdiffError::Config(format!("invalid API base '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(VdiffError::Config(format!(
                "API base '{base_url}' cannot carry a path"
            )));
        }
        let defaults = Timeouts::default();
        Ok(Self {
            http,
            auth,
            base_url,
            request_timeout: defaults.request,
            download_timeout: defaults.download,
        })
    }

    pub fn with_timeouts(mut self, timeouts: &Timeouts) -> Self {
        self.request_timeout = timeouts.request;
        self.download_timeout = timeouts.download;
        self
    }

    /// Node size from the metadata endpoint, rounded to whole pixels.
    pub async fn fetch_dimensions(&self, reference: &DesignReference) -> Result<Viewport> {
        let url = self.endpoint(
            &["files", &reference.document_key, "nodes"],
            &[("ids", reference.node_id.as_str())],
        )?;
        let nodes: NodesResponse =
            with_deadline("dimension lookup", self.request_timeout, self.get_json(&url)).await?;

        let bbox = nodes
            .nodes
            .get(&reference.node_id)
            .and_then(Option::as_ref)
            .and_then(|node| node.document.as_ref())
            .and_then(|doc| doc.absolute_bounding_box.as_ref())
            .ok_or_else(|| {
                VdiffError::remote(
                    None,
                    format!("node {} has no bounding box in {}", reference.node_id, reference.document_key),
                )
            })?;

        let (width, height) = bbox.width.zip(bbox.height).ok_or_else(|| {
            VdiffError::remote(
                None,
                format!("node {} bounding box lacks a numeric size", reference.node_id),
            )
        })?;

        let dims = Viewport::from_design_box(width, height).ok_or_else(|| {
            VdiffError::remote(
                None,
                format!("node {} has a degenerate size {width}x{height}", reference.node_id),
            )
        })?;
        debug!(reference = %reference, width, height, %dims, "resolved design dimensions");
        Ok(dims)
    }

    /// URL of a PNG render of the node at `scale`.
    pub async fn fetch_export_url(&self, reference: &DesignReference, scale: f32) -> Result<String> {
        validate_export_scale(scale)?;
        let scale = scale.to_string();
        let url = self.endpoint(
            &["images", &reference.document_key],
            &[
                ("ids", reference.node_id.as_str()),
                ("format", EXPORT_FORMAT),
                ("scale", scale.as_str()),
            ],
        )?;
        let export: ImagesResponse =
            with_deadline("export lookup", self.request_timeout, self.get_json(&url)).await?;

        if let Some(err) = export.err.filter(|e| !e.trim().is_empty()) {
            return Err(VdiffError::remote(None, format!("export failed: {err}")));
        }

        let image_url = export
            .images
            .get(&reference.node_id)
            .cloned()
            .flatten()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                VdiffError::remote(
                    None,
                    format!("image URL missing for node {}", reference.node_id),
                )
            })?;
        debug!(reference = %reference, %image_url, "resolved export url");
        Ok(image_url)
    }

    /// Both remote lookups for one node. The metadata size is authoritative
    /// for the capture viewport regardless of export scale.
    pub async fn resolve(&self, reference: &DesignReference, scale: f32) -> Result<DesignExport> {
        let dimensions = self.fetch_dimensions(reference).await?;
        let image_url = self.fetch_export_url(reference, scale).await?;
        Ok(DesignExport {
            dimensions,
            image_url,
        })
    }

    /// Download an export to `destination` and return the bytes.
    ///
    /// Export URLs are pre-signed, so no credential is sent.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<Vec<u8>> {
        let response =
            with_deadline("baseline download", self.download_timeout, self.http.get(url, &[]))
                .await?;
        if !response.is_success() {
            return Err(VdiffError::remote(
                Some(response.status),
                format!("image download failed (status {})", response.status),
            ));
        }

        raster::write_bytes(destination, &response.body).await?;
        debug!(
            bytes = response.body.len(),
            destination = %destination.display(),
            "downloaded design export"
        );
        Ok(response.body)
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VdiffError::Config(format!("API base '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let auth = self.auth.as_ref().ok_or(VdiffError::MissingToken)?;
        let headers = [auth.header()?];

        debug!(%url, "design service request");
        let response = self.http.get(url.as_str(), &headers).await?;
        if !response.is_success() {
            return Err(VdiffError::remote(
                Some(response.status),
                error_message(&response),
            ));
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            VdiffError::remote(
                Some(response.status),
                format!("unexpected response body: {e}"),
            )
        })
    }
}

pub fn validate_export_scale(scale: f32) -> Result<()> {
    if !(scale > 0.0 && scale <= MAX_EXPORT_SCALE) {
        return Err(VdiffError::Config(format!(
            "export scale must be within (0, {MAX_EXPORT_SCALE}], got {scale}"
        )));
    }
    Ok(())
}

fn error_message(response: &HttpResponse) -> String {
    let from_body = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|value| {
            value
                .get("err")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        });

    match (response.status, from_body) {
        (429, Some(msg)) => format!("{msg} (rate limited)"),
        (429, None) => "rate limited by the design service".to_string(),
        (_, Some(msg)) => msg,
        (status, None) => format!("design service returned status {status}"),
    }
}
