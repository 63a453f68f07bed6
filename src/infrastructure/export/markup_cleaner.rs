// ============================================================
// MARKUP CLEANER
// ============================================================
// Reduce HTML fragment cells to their visible text or marker value

use scraper::{Html, Selector};
use tracing::trace;

use crate::domain::error::AppError;
use crate::domain::export::{CellValue, PostProcessConfig};

/// The text is not an HTML fragment, so the cell is left as it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseSkipped;

/// Cell cleaner for markup cells
pub struct MarkupCleaner {
    /// Matches the element that may carry a parameter marker
    marker: Selector,

    type_attr: String,

    type_value: String,

    value_attr: String,
}

impl MarkupCleaner {
    pub fn new(config: &PostProcessConfig) -> Result<Self, AppError> {
        let marker = Selector::parse(&config.marker_tag).map_err(|e| {
            AppError::ValidationError(format!("Invalid marker_tag {:?}: {}", config.marker_tag, e))
        })?;

        Ok(Self {
            marker,
            type_attr: config.marker_type_attr.clone(),
            type_value: config.marker_type_value.clone(),
            value_attr: config.marker_value_attr.clone(),
        })
    }

    /// Extract the replacement text for a markup fragment.
    ///
    /// The first marker element decides: if its type attribute matches and the
    /// value attribute is present, that value wins. Otherwise all text nodes
    /// are concatenated in document order. Fragments the parser discards
    /// entirely (`<body></body>`, a bare doctype) have no text and yield "".
    pub fn extract(&self, markup: &str) -> Result<String, ParseSkipped> {
        if !CellValue::looks_like_markup(markup) {
            return Err(ParseSkipped);
        }

        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();

        if let Some(marker) = fragment.select(&self.marker).next() {
            let element = marker.value();
            if element.attr(&self.type_attr) == Some(self.type_value.as_str()) {
                if let Some(info) = element.attr(&self.value_attr) {
                    return Ok(info.to_string());
                }
            }
        }

        Ok(root.text().collect())
    }

    /// Clean a single cell. Only markup cells change.
    pub fn clean(&self, cell: CellValue) -> CellValue {
        match cell {
            CellValue::Markup(markup) => match self.extract(&markup) {
                Ok(text) => CellValue::text(text),
                Err(ParseSkipped) => {
                    trace!(markup = %markup, "cell is not an HTML fragment, keeping it as text");
                    CellValue::text(markup)
                }
            },
            other => other,
        }
    }
}
