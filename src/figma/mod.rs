//! Design-service integration: turning a share link into a baseline image.
//!
//! - [`parse_share_link`] - share link to [`DesignReference`]
//! - [`ReferenceResolver`] - node dimensions, export URL and download
//! - [`FigmaAuth`] - credential header selection
//! - [`api_types`] - JSON response shapes

pub mod api_types;
pub mod auth;
pub mod link;
pub mod resolver;


pub use auth::FigmaAuth;
pub use link::{parse_share_link, DesignReference};
pub use resolver::{
    validate_export_scale, DesignExport, ReferenceResolver, DEFAULT_API_BASE, MAX_EXPORT_SCALE,
};
