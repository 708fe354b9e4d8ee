//! Table layout
//!
//! Computes column widths and row heights in points, from explicit sizes or
//! from a character-count estimate of the cell content. The calculator keeps
//! its track lists between runs and grows them lazily, so a table being
//! resized while it renders never indexes past the end of a list.

use crate::model::{TableCell, TableElement};
use crate::units::{mm_to_point, Rect};
use serde::{Deserialize, Serialize};

/// Smallest computed column width or row height, in points
pub const MIN_TRACK: f64 = 10.0;
/// Value new tracks start out with before they are measured
pub const DEFAULT_TRACK: f64 = 20.0;
/// Average glyph advance as a fraction of the font size
pub const CHAR_WIDTH_FACTOR: f64 = 0.6;
/// Line height as a multiple of the font size
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Upper bounds applied to row and column counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableLimits {
    pub max_rows: usize,
    pub max_columns: usize,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            max_rows: 500,
            max_columns: 64,
        }
    }
}

/// Characters on the longest line
pub fn content_length(content: &str) -> usize {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r').chars().count())
        .max()
        .unwrap_or(0)
}

/// Non-empty lines, split on CR and LF
pub fn line_count(content: &str) -> usize {
    content
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .count()
}

pub fn measure_cell_content_width(content: &str, font_size: f64, cell_padding: f64) -> f64 {
    content_length(content) as f64 * font_size * CHAR_WIDTH_FACTOR + 2.0 * cell_padding
}

pub fn measure_cell_content_height(content: &str, font_size: f64) -> f64 {
    line_count(content) as f64 * font_size * LINE_HEIGHT_FACTOR
}

/// One slot of the grid: a defined cell, or an empty position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFrame {
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
    /// Index into `TableElement::cells`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<usize>,
    /// Relative to the table origin
    pub rect: Rect,
}

/// Computed table geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLayout {
    pub column_widths: Vec<f64>,
    pub row_heights: Vec<f64>,
    pub cell_spacing: f64,
    pub cells: Vec<CellFrame>,
}

impl TableLayout {
    pub fn rows(&self) -> usize {
        self.row_heights.len()
    }

    pub fn columns(&self) -> usize {
        self.column_widths.len()
    }

    pub fn total_width(&self) -> f64 {
        self.column_widths.iter().sum::<f64>() + self.cell_spacing * (self.columns() + 1) as f64
    }

    pub fn total_height(&self) -> f64 {
        self.row_heights.iter().sum::<f64>() + self.cell_spacing * (self.rows() + 1) as f64
    }

    /// Same layout with every length passed through `f`
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            column_widths: self.column_widths.iter().map(|&w| f(w)).collect(),
            row_heights: self.row_heights.iter().map(|&h| f(h)).collect(),
            cell_spacing: f(self.cell_spacing),
            cells: self
                .cells
                .iter()
                .map(|frame| CellFrame {
                    rect: frame.rect.map(&f),
                    ..frame.clone()
                })
                .collect(),
        }
    }
}

/// Reusable column/row calculator
#[derive(Debug, Clone, Default)]
pub struct TableLayoutCalculator {
    column_widths: Vec<f64>,
    row_heights: Vec<f64>,
    limits: TableLimits,
}

impl TableLayoutCalculator {
    pub fn new(limits: TableLimits) -> Self {
        Self {
            column_widths: Vec::new(),
            row_heights: Vec::new(),
            limits,
        }
    }

    /// Row and column counts after clamping to the limits
    pub fn clamped_size(&self, table: &TableElement) -> (usize, usize) {
        let rows = table.rows.min(self.limits.max_rows);
        let columns = table.columns.min(self.limits.max_columns);
        if rows < table.rows || columns < table.columns {
            log::warn!(
                "Table of {}x{} clamped to {}x{}",
                table.rows,
                table.columns,
                rows,
                columns
            );
        }
        (rows, columns)
    }

    /// Lay out `table` into a box `table_width` points wide
    ///
    /// `cell_text` supplies the display text of each defined cell, so bound
    /// cells are measured with their resolved value.
    pub fn calculate(
        &mut self,
        table: &TableElement,
        table_width: f64,
        cell_text: impl Fn(&TableCell) -> String,
    ) -> TableLayout {
        let (rows, columns) = self.clamped_size(table);
        self.ensure_tracks(rows, columns);

        let texts: Vec<Option<String>> = table
            .cells
            .iter()
            .map(|cell| (cell.row < rows && cell.column < columns).then(|| cell_text(cell)))
            .collect();

        self.calculate_column_widths(table, rows, columns, table_width, &texts);
        self.calculate_row_heights(table, rows, columns, &texts);

        let column_widths = self.column_widths[..columns].to_vec();
        let row_heights = self.row_heights[..rows].to_vec();
        let cells = cell_frames(table, &column_widths, &row_heights);

        TableLayout {
            column_widths,
            row_heights,
            cell_spacing: table.cell_spacing,
            cells,
        }
    }

    /// Grow the track lists to the current size, padding with the default
    fn ensure_tracks(&mut self, rows: usize, columns: usize) {
        if self.column_widths.len() < columns {
            self.column_widths.resize(columns, DEFAULT_TRACK);
        }
        if self.row_heights.len() < rows {
            self.row_heights.resize(rows, DEFAULT_TRACK);
        }
    }

    fn calculate_column_widths(
        &mut self,
        table: &TableElement,
        rows: usize,
        columns: usize,
        table_width: f64,
        texts: &[Option<String>],
    ) {
        if columns == 0 {
            return;
        }
        let shared = (table_width - table.cell_spacing * (columns + 1) as f64) / columns as f64;

        for column in 0..columns {
            let width = match explicit(&table.column_widths, column) {
                Some(width) => width,
                // an empty slot still holds its padding
                None if table.auto_size => (0..rows)
                    .map(|row| {
                        table
                            .cells
                            .iter()
                            .zip(texts)
                            .find(|(cell, _)| {
                                cell.row == row && cell.column == column && cell.column_span <= 1
                            })
                            .and_then(|(cell, text)| {
                                text.as_deref().map(|t| {
                                    measure_cell_content_width(
                                        t,
                                        cell_font_size(table, cell),
                                        table.cell_padding,
                                    )
                                })
                            })
                            .unwrap_or(2.0 * table.cell_padding)
                    })
                    .fold(0.0, f64::max)
                    .max(MIN_TRACK),
                None => shared.max(MIN_TRACK),
            };
            self.column_widths[column] = width;
        }
    }

    fn calculate_row_heights(
        &mut self,
        table: &TableElement,
        rows: usize,
        columns: usize,
        texts: &[Option<String>],
    ) {
        for row in 0..rows {
            let height = match explicit(&table.row_heights, row) {
                Some(height) => height,
                None => (0..columns)
                    .map(|column| {
                        let content = table
                            .cells
                            .iter()
                            .zip(texts)
                            .find(|(cell, _)| {
                                cell.row == row && cell.column == column && cell.row_span <= 1
                            })
                            .and_then(|(cell, text)| {
                                text.as_deref().map(|t| {
                                    measure_cell_content_height(t, cell_font_size(table, cell))
                                })
                            })
                            .unwrap_or(0.0);
                        content + 2.0 * table.cell_padding
                    })
                    .fold(0.0, f64::max)
                    .max(MIN_TRACK),
            };
            self.row_heights[row] = height;
        }
    }
}

/// Configured size in points, when positive
fn explicit(sizes_mm: &[f64], index: usize) -> Option<f64> {
    sizes_mm
        .get(index)
        .copied()
        .filter(|&mm| mm > 0.0)
        .map(mm_to_point)
}

pub(crate) fn cell_font_size(table: &TableElement, cell: &TableCell) -> f64 {
    cell.style
        .font
        .as_ref()
        .map(|f| f.size)
        .unwrap_or(table.font.size)
}

/// Frames for every grid slot not covered by a span
fn cell_frames(table: &TableElement, widths: &[f64], heights: &[f64]) -> Vec<CellFrame> {
    let (rows, columns) = (heights.len(), widths.len());
    let spacing = table.cell_spacing;

    let offsets = |tracks: &[f64]| {
        let mut acc = spacing;
        tracks
            .iter()
            .map(|t| {
                let start = acc;
                acc += t + spacing;
                start
            })
            .collect::<Vec<_>>()
    };
    let xs = offsets(widths);
    let ys = offsets(heights);

    let extent = |tracks: &[f64], start: usize, span: usize| {
        let end = (start + span.max(1)).min(tracks.len());
        tracks[start..end].iter().sum::<f64>() + spacing * (end - start - 1) as f64
    };

    let mut covered = vec![false; rows * columns];
    let mut frames = Vec::new();

    for (index, cell) in table.cells.iter().enumerate() {
        if cell.row >= rows || cell.column >= columns || covered[cell.row * columns + cell.column] {
            continue;
        }
        let row_span = cell.row_span.max(1).min(rows - cell.row);
        let column_span = cell.column_span.max(1).min(columns - cell.column);
        for r in cell.row..cell.row + row_span {
            for c in cell.column..cell.column + column_span {
                covered[r * columns + c] = true;
            }
        }
        frames.push(CellFrame {
            row: cell.row,
            column: cell.column,
            row_span,
            column_span,
            cell: Some(index),
            rect: Rect::new(
                xs[cell.column],
                ys[cell.row],
                extent(widths, cell.column, column_span),
                extent(heights, cell.row, row_span),
            ),
        });
    }

    for row in 0..rows {
        for column in 0..columns {
            if !covered[row * columns + column] {
                frames.push(CellFrame {
                    row,
                    column,
                    row_span: 1,
                    column_span: 1,
                    cell: None,
                    rect: Rect::new(xs[column], ys[row], widths[column], heights[row]),
                });
            }
        }
    }

    frames.sort_by_key(|f| (f.row, f.column));
    frames
}
