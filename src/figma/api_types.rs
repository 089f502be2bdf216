//! Wire types for the design service's REST responses.
//!
//! Every field is optional so that partial or unexpected payloads surface as a
//! "missing data" condition in the resolver instead of a parse failure.

use serde::Deserialize;
use std::collections::HashMap;

/// Export format requested from the images endpoint; baselines are PNG only.
pub const EXPORT_FORMAT: &str = "png";

/// `GET /files/{key}/nodes?ids=...`
#[derive(Debug, Default, Deserialize)]
pub struct NodesResponse {
    #[serde(default)]
    pub nodes: HashMap<String, Option<NodeContainer>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NodeContainer {
    pub document: Option<NodeDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub absolute_bounding_box: Option<BoundingBox>,
}

/// Size of a node's bounding box; values may be fractional or absent.
#[derive(Debug, Default, Deserialize)]
pub struct BoundingBox {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// `GET /images/{key}?ids=...`
///
/// A rendering failure for a node is reported as `null` in `images`.
#[derive(Debug, Default, Deserialize)]
pub struct ImagesResponse {
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
    pub err: Option<String>,
}
