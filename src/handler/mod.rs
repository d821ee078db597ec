//! Request handler module
//!
//! Method dispatch in `router`, file resolution and loading in `static_files`.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
pub use static_files::{RequestOutcome, Responder, ResponderConfig};
