//! Table width resolution
//!
//! Table-level attributes (left indent, alignment, preferred width) are
//! stored on every column, but only the first column's values are read.
//! Widths are kept in points on the model and compared in pixels against
//! the page's working area.

use crate::{format_points, pixels_to_points, points_to_pixels};
use serde::{Deserialize, Serialize};
use table_model::{
    keys, FormatValue, Formats, NodeId, NodeKind, Result, TableDocument, TableModelError,
    DEFAULT_COLUMN_WIDTH,
};

/// Page width and horizontal padding, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetrics {
    pub page_width_px: f64,
    pub padding_left_px: f64,
    pub padding_right_px: f64,
}

impl Default for PageMetrics {
    fn default() -> Self {
        // Letter width with one inch padding on each side
        Self {
            page_width_px: 816.0,
            padding_left_px: 96.0,
            padding_right_px: 96.0,
        }
    }
}

impl PageMetrics {
    /// Width available to content
    pub fn working_area_px(&self) -> f64 {
        (self.page_width_px - self.padding_left_px - self.padding_right_px).max(0.0)
    }
}

/// Stored preferred width of a table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferredWidth {
    /// `0`, empty or unparseable
    Auto,
    Points(f64),
    Percent(f64),
}

impl PreferredWidth {
    /// Parse `300`, `"300pt"` or `"50%"`
    pub fn parse(value: &FormatValue) -> Self {
        let percent = matches!(value, FormatValue::Text(text) if text.trim_end().ends_with('%'));
        match value.as_f64() {
            Some(amount) if amount.is_finite() && amount > 0.0 => {
                if percent {
                    PreferredWidth::Percent(amount)
                } else {
                    PreferredWidth::Points(amount)
                }
            }
            _ => PreferredWidth::Auto,
        }
    }

    /// Width in points, resolving percentages against `working_pt`
    pub fn to_points(self, working_pt: f64) -> Option<f64> {
        match self {
            PreferredWidth::Auto => None,
            PreferredWidth::Points(points) => Some(points),
            PreferredWidth::Percent(percent) => Some(working_pt * percent / 100.0),
        }
    }

    pub fn is_auto(self) -> bool {
        self == PreferredWidth::Auto
    }
}

/// Horizontal placement of a table on the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl TableAlignment {
    /// Stored as `0`, `1` or `2`; anything else reads as left
    pub fn parse(value: &FormatValue) -> Self {
        match value.as_f64() {
            Some(code) if code == 1.0 => TableAlignment::Center,
            Some(code) if code == 2.0 => TableAlignment::Right,
            _ => TableAlignment::Left,
        }
    }
}

/// Table-level attributes, read from the first column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableAttributes {
    pub left_indent_pt: f64,
    pub alignment: TableAlignment,
    pub preferred_width: PreferredWidth,
}

impl TableAttributes {
    pub fn read(document: &TableDocument, table: NodeId) -> Option<Self> {
        let first = *document.columns(table).first()?;
        let read = |key: &str| document.format(first, key);

        Some(Self {
            left_indent_pt: read(keys::LEFT_INDENT)
                .and_then(|value| value.as_f64())
                .filter(|indent| indent.is_finite())
                .unwrap_or(0.0),
            alignment: read(keys::ALIGNMENT)
                .map(|value| TableAlignment::parse(&value))
                .unwrap_or_default(),
            preferred_width: read(keys::PREFERRED_WIDTH)
                .map(|value| PreferredWidth::parse(&value))
                .unwrap_or(PreferredWidth::Auto),
        })
    }
}

/// Resolved table width
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResolvedWidth {
    /// 100% of the container
    FullWidth,
    Points(f64),
}

/// Style the host applies to a rendered table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    pub width: ResolvedWidth,
    /// Left margin in points; `None` when no margin applies
    pub margin_left_pt: Option<f64>,
    pub alignment: TableAlignment,
}

/// Free-flow width of a table: the sum of its column widths in points
pub fn columns_width_pt(document: &TableDocument, table: NodeId) -> f64 {
    document
        .columns(table)
        .iter()
        .map(|&column| document.column_width(column))
        .sum()
}

fn all_columns_default(document: &TableDocument, table: NodeId) -> bool {
    document
        .columns(table)
        .iter()
        .all(|&column| document.column_width(column) == DEFAULT_COLUMN_WIDTH)
}

/// Resolve width, margin and alignment of a table.
///
/// - auto preferred width with every column at the default width: full width
/// - explicit preferred width that with the indent overflows the working
///   area: full width without margin
/// - explicit preferred width that fits: the preferred width
/// - otherwise the sum of the column widths
///
/// Returns `None` for a table without columns.
pub fn resolve_table_style(
    document: &TableDocument,
    table: NodeId,
    page: &PageMetrics,
) -> Option<TableStyle> {
    let attributes = TableAttributes::read(document, table)?;
    let working_pt = pixels_to_points(page.working_area_px());
    let indent = attributes.left_indent_pt;
    let margin_left_pt = (indent != 0.0).then_some(indent);

    let full_width = TableStyle {
        width: ResolvedWidth::FullWidth,
        margin_left_pt: None,
        alignment: attributes.alignment,
    };

    let style = match attributes.preferred_width.to_points(working_pt) {
        None if all_columns_default(document, table) => full_width,
        None => TableStyle {
            width: ResolvedWidth::Points(columns_width_pt(document, table)),
            margin_left_pt,
            alignment: attributes.alignment,
        },
        Some(preferred) if preferred + indent.abs() > working_pt => full_width,
        Some(preferred) => TableStyle {
            width: ResolvedWidth::Points(preferred),
            margin_left_pt,
            alignment: attributes.alignment,
        },
    };
    Some(style)
}

/// Attributes for a column about to be inserted next to `reference` (or
/// after the last column).
///
/// When the widened table plus its left margin no longer fits the working
/// area, every existing column is resized to an equal share and the new
/// column gets the same share. A set preferred width is updated on every
/// column to the new table width.
pub fn column_attributes_for_insert(
    document: &mut TableDocument,
    table: NodeId,
    reference: Option<NodeId>,
    page: &PageMetrics,
) -> Result<Formats> {
    let columns = document.columns(table);
    let source = match reference {
        Some(column) => {
            document.expect_kind(column, NodeKind::Column)?;
            column
        }
        None => *columns
            .last()
            .ok_or_else(|| TableModelError::Structure("table has no columns".to_string()))?,
    };

    let mut attributes = document.formats(source)?;
    let indent_pt = TableAttributes::read(document, table)
        .map(|table_attributes| table_attributes.left_indent_pt.abs())
        .unwrap_or(0.0);
    let margin_px = points_to_pixels(indent_pt);
    let working_px = page.working_area_px();
    let mut table_px =
        points_to_pixels(columns_width_pt(document, table) + document.column_width(source));

    if table_px + margin_px > working_px {
        let share = (columns.len() + 1) as f64;
        let per_column_px = (working_px - margin_px) / share;
        let per_column_pt = pixels_to_points(per_column_px);
        tracing::debug!(
            "Column insert overflows the page, resizing {} columns to {}pt",
            columns.len() + 1,
            per_column_pt
        );

        for &column in &columns {
            document.set_format(column, keys::WIDTH, Some(per_column_pt.into()))?;
        }
        attributes.insert(keys::WIDTH.to_string(), per_column_pt.into());
        table_px = per_column_px * share;
    }

    let preferred = attributes
        .get(keys::PREFERRED_WIDTH)
        .map(PreferredWidth::parse)
        .unwrap_or(PreferredWidth::Auto);
    if !preferred.is_auto() {
        let width = format_points(pixels_to_points(table_px));
        for &column in &columns {
            document.set_format(column, keys::PREFERRED_WIDTH, Some(width.as_str().into()))?;
        }
        attributes.insert(keys::PREFERRED_WIDTH.to_string(), width.into());
    }

    Ok(attributes)
}

/// Rewrite a set preferred width on every column to `width_pt`.
///
/// Returns whether anything changed; an auto preferred width is left alone.
pub fn sync_preferred_width(
    document: &mut TableDocument,
    table: NodeId,
    width_pt: f64,
) -> Result<bool> {
    let preferred = TableAttributes::read(document, table)
        .map(|attributes| attributes.preferred_width)
        .unwrap_or(PreferredWidth::Auto);
    if preferred.is_auto() {
        return Ok(false);
    }

    let width = format_points(width_pt);
    for column in document.columns(table) {
        document.set_format(column, keys::PREFERRED_WIDTH, Some(width.as_str().into()))?;
    }
    Ok(true)
}

/// Post-commit layout hook, run by the host once the table has been
/// rendered.
///
/// Syncs a set preferred width to the measured width (when given) and
/// resolves the table style. A table that is no longer attached is ignored.
pub fn after_render(
    document: &mut TableDocument,
    table: NodeId,
    page: &PageMetrics,
    rendered_width_px: Option<f64>,
) -> Result<Option<TableStyle>> {
    if !document.is_attached(table) {
        tracing::debug!("Skipping layout of detached table {}", table);
        return Ok(None);
    }

    if let Some(width_px) = rendered_width_px {
        sync_preferred_width(document, table, pixels_to_points(width_px))?;
    }
    Ok(resolve_table_style(document, table, page))
}
