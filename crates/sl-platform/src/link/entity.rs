//! Link resource

use serde::{Deserialize, Serialize};
use sl_mapping::ResourceRef;

/// Target of a shortened URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub long_url: String,
}

impl ResourceRef for LinkTarget {
    const DOMAIN: &'static str = "link";
}
