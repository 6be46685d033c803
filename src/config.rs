//! Configuration for a matching run.
//!
//! Every tunable that used to be a magic number in the reference tool (row
//! tolerance, paddings, full-width margins, highlight color) lives here with a
//! documented default.

use crate::error::{Error, Result};
use crate::highlight::HighlightPolicy;
use crate::identifiers::LoaderOptions;
use crate::report::DEFAULT_REPORT_COLUMN;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default vertical tolerance for row membership, in page units.
pub const DEFAULT_ROW_TOLERANCE: f32 = 1.5;

/// Default vertical padding applied to a token that sits alone on its row.
pub const DEFAULT_ROW_PADDING: f32 = 1.0;

/// Default left/right margin for full-width row highlights.
pub const DEFAULT_FULL_WIDTH_MARGIN: f32 = 10.0;

/// Horizontal extent of a row highlight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum RowSpan {
    /// From the leftmost to the rightmost token of the row.
    #[default]
    Content,
    /// Across the whole page, inset by `margin` on both sides.
    FullWidth {
        /// Inset from each page edge
        margin: f32,
    },
}

/// Row grouping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowOptions {
    /// Two spans are on the same row if either midpoint falls inside the other
    /// span widened by this amount.
    pub tolerance: f32,
    /// Vertical padding for a token that has no row neighbours.
    pub padding: f32,
    /// Horizontal extent of the resulting rectangle.
    pub span: RowSpan,
}

impl Default for RowOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_ROW_TOLERANCE,
            padding: DEFAULT_ROW_PADDING,
            span: RowSpan::Content,
        }
    }
}

/// Visual style of the highlight annotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    /// RGB components in 0..=1
    pub color: [f32; 3],
    /// Opacity in 0..=1
    pub opacity: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 0.0],
            opacity: 0.4,
        }
    }
}

impl HighlightStyle {
    /// Yellow highlight with the default opacity.
    pub fn yellow() -> Self {
        Self::default()
    }

    /// Set the opacity (clamped to 0..=1).
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extent of each identifier highlight.
    pub policy: HighlightPolicy,
    /// Row grouping parameters (used by `RowBound` and fixed phrase search).
    pub rows: RowOptions,
    /// Structural phrases that are always highlighted but never count as identifiers.
    pub fixed_phrases: Vec<String>,
    /// Case folding for fixed phrase search.
    pub phrase_case_insensitive: bool,
    /// Highlight appearance.
    pub style: HighlightStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            policy: HighlightPolicy::TokenBound,
            rows: RowOptions::default(),
            fixed_phrases: Vec::new(),
            phrase_case_insensitive: false,
            style: HighlightStyle::default(),
        }
    }

    /// Set the highlight policy.
    pub fn with_policy(mut self, policy: HighlightPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the row membership tolerance.
    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.rows.tolerance = tolerance;
        self
    }

    /// Set the padding used for tokens alone on their row.
    pub fn with_row_padding(mut self, padding: f32) -> Self {
        self.rows.padding = padding;
        self
    }

    /// Set the horizontal extent of row highlights.
    pub fn with_row_span(mut self, span: RowSpan) -> Self {
        self.rows.span = span;
        self
    }

    /// Add a structural phrase to always highlight.
    pub fn with_fixed_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.fixed_phrases.push(phrase.into());
        self
    }

    /// Set case folding for fixed phrase search.
    pub fn with_phrase_case_insensitive(mut self, value: bool) -> Self {
        self.phrase_case_insensitive = value;
        self
    }

    /// Set the highlight style.
    pub fn with_style(mut self, style: HighlightStyle) -> Self {
        self.style = style;
        self
    }

    /// Reject values that would make geometry meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.rows.tolerance.is_finite() || self.rows.tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "row tolerance must be a non-negative number, got {}",
                self.rows.tolerance
            )));
        }
        if !self.rows.padding.is_finite() || self.rows.padding < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "row padding must be a non-negative number, got {}",
                self.rows.padding
            )));
        }
        if let RowSpan::FullWidth { margin } = self.rows.span {
            if !margin.is_finite() || margin < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "full-width margin must be a non-negative number, got {}",
                    margin
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.style.opacity) {
            return Err(Error::InvalidConfig(format!(
                "opacity must be between 0 and 1, got {}",
                self.style.opacity
            )));
        }
        if self.style.color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(Error::InvalidConfig(format!(
                "color components must be between 0 and 1, got {:?}",
                self.style.color
            )));
        }
        if self.fixed_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::InvalidConfig("fixed phrases must not be blank".to_string()));
        }
        Ok(())
    }

    /// Parse and validate an engine-only JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read an engine-only JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path.as_ref())?)
    }
}

/// Everything a config file can set: engine, loader and report options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdmarkConfig {
    /// Matching and annotation settings
    pub engine: EngineConfig,
    /// Identifier source settings
    pub loader: LoaderOptions,
    /// Column header of the unmatched report
    pub report_column: String,
}

impl Default for IdmarkConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            loader: LoaderOptions::default(),
            report_column: DEFAULT_REPORT_COLUMN.to_string(),
        }
    }
}

impl IdmarkConfig {
    /// Parse a JSON document. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: IdmarkConfig = serde_json::from_str(json)?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }
}
