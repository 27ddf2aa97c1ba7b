//! Attribute storage for table nodes
//!
//! Every node carries a flat key/value map. Row and cell keys share one
//! namespace and column keys live in another; each node kind only accepts
//! its own keys (see [`accepts_key`]).

use crate::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a single node
pub type Formats = BTreeMap<String, FormatValue>;

/// A single attribute value: a string or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatValue {
    Number(f64),
    Text(String),
}

impl FormatValue {
    /// Falsy values clear an attribute instead of being stored
    pub fn is_falsy(&self) -> bool {
        match self {
            FormatValue::Number(n) => *n == 0.0 || n.is_nan(),
            FormatValue::Text(s) => s.is_empty(),
        }
    }

    /// Numeric reading. Text is read up to its first non-numeric character,
    /// so `"300pt"` reads as 300.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormatValue::Number(n) => Some(*n),
            FormatValue::Text(s) => leading_number(s),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormatValue::Text(s) => Some(s),
            FormatValue::Number(_) => None,
        }
    }
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}

impl std::fmt::Display for FormatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatValue::Number(n) => write!(f, "{}", n),
            FormatValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FormatValue {
    fn from(value: &str) -> Self {
        FormatValue::Text(value.to_string())
    }
}

impl From<String> for FormatValue {
    fn from(value: String) -> Self {
        FormatValue::Text(value)
    }
}

impl From<f64> for FormatValue {
    fn from(value: f64) -> Self {
        FormatValue::Number(value)
    }
}

impl From<u32> for FormatValue {
    fn from(value: u32) -> Self {
        FormatValue::Number(f64::from(value))
    }
}

/// Attribute names
pub mod keys {
    pub const ROW: &str = "row";
    pub const CELL: &str = "cell";
    pub const ROWSPAN: &str = "rowspan";
    pub const COLSPAN: &str = "colspan";

    pub const CELL_BG: &str = "cell_bg";
    pub const VERTICAL_ALIGNMENT: &str = "cell_vertical_alignment";
    pub const HORIZONTAL_ALIGNMENT: &str = "cell_horizontal_alignment";
    pub const BORDER_TOP_COLOR: &str = "cell_btc";
    pub const BORDER_BOTTOM_COLOR: &str = "cell_bbc";
    pub const BORDER_RIGHT_COLOR: &str = "cell_brc";
    pub const BORDER_LEFT_COLOR: &str = "cell_blc";
    pub const BORDER_TOP_SIZE: &str = "cell_bts";
    pub const BORDER_BOTTOM_SIZE: &str = "cell_bbs";
    pub const BORDER_RIGHT_SIZE: &str = "cell_brs";
    pub const BORDER_LEFT_SIZE: &str = "cell_bls";
    pub const ROW_HEIGHT: &str = "row_height";

    /// Heading level of a cell line holding a heading block
    pub const HEADER: &str = "header";

    pub const WIDTH: &str = "width";
    pub const LEFT_INDENT: &str = "left_indent";
    pub const ALIGNMENT: &str = "alignment";
    pub const PREFERRED_WIDTH: &str = "preferred_width";
}

/// Span keys shared by cells and their lines
pub const SPAN_KEYS: [&str; 2] = [keys::ROWSPAN, keys::COLSPAN];

/// Visual cell keys; a cell writes them through to its lines
pub const CELL_STYLE_KEYS: [&str; 12] = [
    keys::CELL_BG,
    keys::VERTICAL_ALIGNMENT,
    keys::HORIZONTAL_ALIGNMENT,
    keys::BORDER_TOP_COLOR,
    keys::BORDER_BOTTOM_COLOR,
    keys::BORDER_RIGHT_COLOR,
    keys::BORDER_LEFT_COLOR,
    keys::BORDER_TOP_SIZE,
    keys::BORDER_BOTTOM_SIZE,
    keys::BORDER_RIGHT_SIZE,
    keys::BORDER_LEFT_SIZE,
    keys::ROW_HEIGHT,
];

/// Column keys. Only `width` is per column; the other three are table-level
/// values of which only the first column's copy is read.
pub const COLUMN_KEYS: [&str; 4] = [
    keys::WIDTH,
    keys::LEFT_INDENT,
    keys::ALIGNMENT,
    keys::PREFERRED_WIDTH,
];

/// Column width in points when none is stored
pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;

/// Value a column attribute falls back to when absent or cleared
pub fn column_default(key: &str) -> Option<FormatValue> {
    match key {
        keys::WIDTH => Some(FormatValue::Number(DEFAULT_COLUMN_WIDTH)),
        keys::LEFT_INDENT | keys::ALIGNMENT | keys::PREFERRED_WIDTH => {
            Some(FormatValue::Number(0.0))
        }
        _ => None,
    }
}

/// The full column default table
pub fn column_defaults() -> Formats {
    COLUMN_KEYS
        .iter()
        .filter_map(|key| column_default(key).map(|value| (key.to_string(), value)))
        .collect()
}

/// Canonical spelling of an attribute name (`cell-bg` is accepted for `cell_bg`)
pub fn canonical_key(name: &str) -> &str {
    match name {
        "cell-bg" => keys::CELL_BG,
        other => other,
    }
}

/// Whether nodes of `kind` store the attribute `key`
pub fn accepts_key(kind: NodeKind, key: &str) -> bool {
    match kind {
        NodeKind::Column => COLUMN_KEYS.contains(&key),
        NodeKind::Row => key == keys::ROW || key == keys::ROW_HEIGHT,
        NodeKind::Cell => {
            key == keys::ROW || SPAN_KEYS.contains(&key) || CELL_STYLE_KEYS.contains(&key)
        }
        NodeKind::CellLine => {
            key == keys::ROW
                || key == keys::CELL
                || key == keys::HEADER
                || SPAN_KEYS.contains(&key)
                || CELL_STYLE_KEYS.contains(&key)
        }
        NodeKind::Table | NodeKind::ColumnGroup | NodeKind::Body => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        assert!(FormatValue::from("").is_falsy());
        assert!(FormatValue::from(0.0).is_falsy());
        assert!(FormatValue::Number(f64::NAN).is_falsy());
        assert!(!FormatValue::from("0").is_falsy());
        assert!(!FormatValue::from(2u32).is_falsy());
    }

    #[test]
    fn test_numeric_reading() {
        assert_eq!(FormatValue::from("300pt").as_f64(), Some(300.0));
        assert_eq!(FormatValue::from("50%").as_f64(), Some(50.0));
        assert_eq!(FormatValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(FormatValue::from("-4").as_f64(), Some(-4.0));
        assert_eq!(FormatValue::from("auto").as_f64(), None);
        assert_eq!(FormatValue::from(7.0).as_f64(), Some(7.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(FormatValue::from(2.0).to_string(), "2");
        assert_eq!(FormatValue::from(2.5).to_string(), "2.5");
        assert_eq!(FormatValue::from("row-x").to_string(), "row-x");
    }

    #[test]
    fn test_untagged_serde() {
        let formats: Formats =
            serde_json::from_str(r#"{"row":"row-a","colspan":2,"width":"120"}"#).unwrap();
        assert_eq!(formats["row"], FormatValue::from("row-a"));
        assert_eq!(formats["colspan"], FormatValue::from(2.0));
        assert_eq!(formats["width"].as_f64(), Some(120.0));
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        for key in COLUMN_KEYS {
            assert!(!accepts_key(NodeKind::Cell, key));
            assert!(!accepts_key(NodeKind::Row, key));
            assert!(!accepts_key(NodeKind::CellLine, key));
        }
        assert!(!accepts_key(NodeKind::Column, keys::ROW));
        assert!(!accepts_key(NodeKind::Row, keys::COLSPAN));
        assert!(accepts_key(NodeKind::CellLine, keys::HEADER));
        assert!(!accepts_key(NodeKind::Cell, keys::HEADER));
        assert!(!accepts_key(NodeKind::Body, keys::ROW));
    }

    #[test]
    fn test_column_defaults() {
        let defaults = column_defaults();
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults[keys::WIDTH], FormatValue::from(100.0));
        assert_eq!(defaults[keys::PREFERRED_WIDTH], FormatValue::from(0.0));
        assert_eq!(column_default(keys::ROW), None);
    }

    #[test]
    fn test_cell_bg_alias() {
        assert_eq!(canonical_key("cell-bg"), keys::CELL_BG);
        assert_eq!(canonical_key("colspan"), keys::COLSPAN);
    }
}
