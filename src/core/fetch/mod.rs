//! Source retrieval
//!
//! - [`strategy`] - direct, discovery-then-fetch and query strategies
//! - [`extract`] - dotted-path payload extraction
//! - [`template`] - `{param}` URL templating

pub mod extract;
pub mod strategy;
pub mod template;

pub use extract::extract_response_data;
pub use strategy::SourceFetcher;
pub use template::render_template;
