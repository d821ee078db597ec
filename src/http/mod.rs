//! HTTP protocol layer module
//!
//! MIME resolution, response header policy and response builders. Nothing here
//! touches the filesystem or the network.

pub mod headers;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use headers::{build_headers, HeaderCategories, HeaderPolicy, HeaderProfile, PathPredicate};
pub use mime::{resolve_mime_type, MimeOptions, MimeRule};
pub use response::{
    build_405_response, build_error_response, build_file_response, build_options_response,
    build_redirect_response,
};
