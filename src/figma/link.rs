//! Share-link parsing.

use serde::{Deserialize, Serialize};
use url::Url;

/// Path segments that precede the document key in a share link.
const ROUTE_MARKERS: &[&str] = &["design", "file"];

/// A document key plus a node id in the API's colon-separated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignReference {
    pub document_key: String,
    pub node_id: String,
}

impl DesignReference {
    /// Node id in the hyphen form used by share links (`1:2` -> `1-2`).
    pub fn share_node_id(&self) -> String {
        self.node_id.replace(':', "-")
    }
}

impl std::fmt::Display for DesignReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.document_key, self.node_id)
    }
}

/// Parse a share link such as `https://www.figma.com/design/KEY/Name?node-id=1-2`.
///
/// Returns `None` for anything that does not carry both a document key after a
/// `design`/`file` segment and a `node-id` query parameter.
pub fn parse_share_link(link: &str) -> Option<DesignReference> {
    let url = Url::parse(link.trim()).ok()?;

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    segments.find(|s| ROUTE_MARKERS.contains(s))?;
    let document_key = segments.next()?.to_string();

    let raw_node = url
        .query_pairs()
        .find(|(k, _)| k == "node-id")
        .map(|(_, v)| v.into_owned())?;
    let node_id = normalize_node_id(&raw_node)?;

    Some(DesignReference {
        document_key,
        node_id,
    })
}

fn normalize_node_id(raw: &str) -> Option<String> {
    let node_id = raw.trim().replace('-', ":");
    if node_id.is_empty() || node_id.split(':').any(str::is_empty) {
        return None;
    }
    Some(node_id)
}
