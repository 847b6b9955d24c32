use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Stroke used for the canvas outline drawn into preview markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutlineStyle {
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            stroke: "#b91c1c".to_string(),
            stroke_width: 3.0,
        }
    }
}

/// Session-wide editor settings.
///
/// Every field has a default, so a JSON config only needs to list what it overrides:
///
/// ```
/// use duplicator_core::EditorOptions;
///
/// let options = EditorOptions::from_json_str(r#"{ "batchLimit": 2 }"#)?;
/// assert_eq!(options.batch_limit, 2);
/// assert_eq!(options.export_file_name, "edited-svg.png");
/// # Ok::<(), duplicator_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorOptions {
    /// Natural width used when the SVG declares neither `width`/`height` nor a `viewBox`.
    pub default_width: f64,
    pub default_height: f64,
    /// Maximum number of images a single batch replacement applies.
    pub batch_limit: usize,
    pub outline: OutlineStyle,
    pub export_file_name: String,
    /// CSS color painted under the artwork on export. Transparent when `None`.
    pub background: Option<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            default_width: 800.0,
            default_height: 600.0,
            batch_limit: crate::registry::BATCH_LIMIT,
            outline: OutlineStyle::default(),
            export_file_name: "edited-svg.png".to_string(),
            background: None,
        }
    }
}

impl EditorOptions {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text).map_err(|e| Error::InvalidOptions {
            message: e.to_string(),
        })?;
        options.validated()
    }

    fn validated(self) -> Result<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.default_width) || !positive(self.default_height) {
            return Err(Error::InvalidOptions {
                message: "defaultWidth and defaultHeight must be positive".to_string(),
            });
        }
        if self.export_file_name.trim().is_empty() {
            return Err(Error::InvalidOptions {
                message: "exportFileName must not be empty".to_string(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options =
            EditorOptions::from_json_str(r##"{ "outline": { "stroke": "#000" } }"##).unwrap();
        assert_eq!(options.outline.stroke, "#000");
        assert_eq!(options.outline.stroke_width, 3.0);
        assert_eq!(options.batch_limit, 3);
        assert_eq!(options.default_width, 800.0);
    }

    #[test]
    fn rejects_non_positive_default_size() {
        let err = EditorOptions::from_json_str(r#"{ "defaultWidth": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOptions { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(EditorOptions::from_json_str("{ nope").is_err());
    }
}
