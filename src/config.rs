// Print configuration
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::canvas::font::UnicodeBucket;

/// Families tried, in order, for graphemes the element's font cannot draw
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackFamilies {
    pub cjk: Vec<String>,
    pub emoji: Vec<String>,
    pub symbol: Vec<String>,
    pub generic: Vec<String>,
}

impl FallbackFamilies {
    pub fn for_bucket(&self, bucket: UnicodeBucket) -> &[String] {
        match bucket {
            UnicodeBucket::Cjk => &self.cjk,
            UnicodeBucket::Emoji => &self.emoji,
            UnicodeBucket::Symbol => &self.symbol,
            UnicodeBucket::Generic => &self.generic,
        }
    }
}

impl Default for FallbackFamilies {
    fn default() -> Self {
        let families = |names: &[&str]| names.iter().map(|name| name.to_string()).collect();
        Self {
            cjk: families(&["Noto Sans CJK SC", "Noto Sans CJK JP", "Source Han Sans", "PingFang SC", "Microsoft YaHei"]),
            emoji: families(&["Noto Color Emoji", "Apple Color Emoji", "Segoe UI Emoji"]),
            symbol: families(&["Noto Sans Symbols", "Noto Sans Symbols 2", "DejaVu Sans", "Segoe UI Symbol"]),
            generic: families(&["Noto Sans", "DejaVu Sans", "Arial"]),
        }
    }
}

/// Configuration for rendering a document to PDF
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Page width in CSS pixels
    pub page_width: f64,
    /// Page height in CSS pixels
    pub page_height: f64,
    /// PDF points per CSS pixel
    pub scale: f64,
    /// Painted under every page; `None` leaves pages transparent
    pub background_color: Option<String>,
    /// Used when none of an element's families match
    pub default_font_family: String,
    pub fallback_families: FallbackFamilies,
    /// Relative resource urls are resolved against this directory
    pub resource_dir: PathBuf,
    /// Document title written to the PDF metadata
    pub title: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_width: 816.0,  // US Letter at 96 dpi
            page_height: 1056.0,
            scale: 0.75,
            background_color: Some("white".to_string()),
            default_font_family: "sans-serif".to_string(),
            fallback_families: FallbackFamilies::default(),
            resource_dir: PathBuf::from("."),
            title: None,
        }
    }
}

impl RenderConfig {
    pub fn page_size(&self) -> kurbo::Size {
        kurbo::Size::new(self.page_width, self.page_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{ "page_width": 600, "title": "Report" }"#).unwrap();
        assert_eq!(config.page_width, 600.0);
        assert_eq!(config.page_height, 1056.0);
        assert_eq!(config.title.as_deref(), Some("Report"));
        assert!(!config.fallback_families.for_bucket(UnicodeBucket::Cjk).is_empty());
    }
}
