//! Note resource

use serde::{Deserialize, Serialize};
use sl_mapping::ResourceRef;

/// Characters of content shown in a save response before truncation
pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
}

impl ResourceRef for Note {
    const DOMAIN: &'static str = "note";
}

impl Note {
    /// First [`PREVIEW_CHARS`] characters, with `...` appended when cut.
    pub fn preview(&self) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(content: &str) -> Note {
        Note {
            title: "t".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_preview() {
        assert_eq!(note("short").preview(), "short");
        assert_eq!(note(&"a".repeat(50)).preview(), "a".repeat(50));
        assert_eq!(note(&"a".repeat(51)).preview(), format!("{}...", "a".repeat(50)));
        // Multi-byte content is cut on character boundaries
        assert_eq!(note(&"é".repeat(60)).preview(), format!("{}...", "é".repeat(50)));
    }
}
