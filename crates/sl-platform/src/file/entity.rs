//! File resource

use serde::{Deserialize, Serialize};
use sl_mapping::ResourceRef;

/// Content types accepted for upload
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "application/pdf",
];

/// Uploaded file metadata. The bytes live in the blob store under
/// `stored_filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
}

impl ResourceRef for StoredFile {
    const DOMAIN: &'static str = "file";
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// `{uuid}.{ext}` where ext comes from the original name when it is a plain
/// short alphanumeric suffix.
pub fn stored_name_for(original_filename: &str, id: uuid::Uuid) -> String {
    let ext = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match ext {
        Some(ext) => format!("{}.{}", id, ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_keeps_safe_extension() {
        let id = uuid::Uuid::nil();
        assert_eq!(stored_name_for("photo.PNG", id), format!("{}.png", id));
        assert_eq!(stored_name_for("archive.tar.gz", id), format!("{}.gz", id));
        assert_eq!(stored_name_for("README", id), id.to_string());
        assert_eq!(stored_name_for("evil.pdf/../../x", id), id.to_string());
    }

    #[test]
    fn test_allowed_content_types() {
        assert!(is_allowed_content_type("application/pdf"));
        assert!(is_allowed_content_type("image/jpg"));
        assert!(!is_allowed_content_type("text/html"));
        assert!(!is_allowed_content_type("image/svg+xml"));
    }
}
