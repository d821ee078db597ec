//! Startup readiness check
//!
//! Looks for the assets the demo page needs. Missing files are reported but
//! never stop the server from starting.

use std::path::Path;

use crate::logger;

/// Return the entries of `required` that do not exist under `document_root`
pub fn missing_assets(document_root: &Path, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|asset| !document_root.join(asset.trim_start_matches('/')).exists())
        .cloned()
        .collect()
}

/// Size of the configured index file at the root, if it is a regular file
pub fn index_size(document_root: &Path, index_file: &str) -> Option<u64> {
    std::fs::metadata(document_root.join(index_file))
        .ok()
        .filter(std::fs::Metadata::is_file)
        .map(|metadata| metadata.len())
}

/// Log the readiness check result; returns whether every asset was found
///
/// The size of `index_file` at the root is logged when it exists.
pub fn check_required_assets(document_root: &Path, required: &[String], index_file: &str) -> bool {
    if let Some(size) = index_size(document_root, index_file) {
        logger::log_info(&format!("Main page {index_file}: {size} bytes"));
    }

    if required.is_empty() {
        return true;
    }

    let missing = missing_assets(document_root, required);
    if missing.is_empty() {
        logger::log_info(&format!("All {} required files found", required.len()));
    } else {
        logger::log_warning(&format!(
            "Missing {} of {} expected files (serving anyway):",
            missing.len(),
            required.len()
        ));
        for asset in &missing {
            logger::log_warning(&format!("  - {asset}"));
        }
    }

    missing.is_empty()
}
