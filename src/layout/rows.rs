//! Row grouping: which tokens sit on the same horizontal text line.
//!
//! Two boxes share a row when the vertical midpoint of either one lies inside
//! the other's vertical span widened by the row tolerance. The rule is
//! symmetric, so the outcome never depends on which token is the target.

use crate::config::{RowOptions, RowSpan};
use crate::document::Token;
use crate::geometry::Rect;

/// Symmetric same-row test.
///
/// # Examples
///
/// ```
/// use pdf_idmark::geometry::Rect;
/// use pdf_idmark::layout::same_row;
///
/// let label = Rect::new(10.0, 700.0, 60.0, 712.0);
/// let value = Rect::new(80.0, 701.0, 120.0, 711.0);
/// let below = Rect::new(10.0, 680.0, 60.0, 692.0);
/// assert!(same_row(&label, &value, 1.5));
/// assert!(!same_row(&label, &below, 1.5));
/// ```
pub fn same_row(a: &Rect, b: &Rect, tolerance: f32) -> bool {
    let inside = |mid: f32, span: &Rect| mid >= span.y0 - tolerance && mid <= span.y1 + tolerance;
    inside(a.mid_y(), b) || inside(b.mid_y(), a)
}

/// Row lookups for the tokens of one page.
#[derive(Debug, Clone)]
pub struct RowGrouper<'t> {
    tokens: &'t [Token],
    page: Rect,
    options: RowOptions,
}

impl<'t> RowGrouper<'t> {
    /// Create a grouper over a page's tokens.
    pub fn new(tokens: &'t [Token], page: Rect, options: RowOptions) -> Self {
        Self { tokens, page, options }
    }

    /// Tokens on the same row as `target`, in content order.
    ///
    /// The token that produced `target` is included when it is part of the page.
    pub fn members(&self, target: &Rect) -> Vec<&'t Token> {
        self.tokens
            .iter()
            .filter(|t| same_row(&t.bbox, target, self.options.tolerance))
            .collect()
    }

    /// Rectangle covering the whole row of `target`.
    ///
    /// The result always contains `target`. When no other token shares the
    /// row, it is `target` padded vertically by the row padding.
    pub fn row_rect(&self, target: &Rect) -> Rect {
        let others: Vec<&Token> = self
            .members(target)
            .into_iter()
            .filter(|t| t.bbox != *target)
            .collect();

        let row = if others.is_empty() {
            target.pad_vertical(self.options.padding)
        } else {
            others.iter().fold(*target, |acc, t| acc.union(&t.bbox))
        };

        match self.options.span {
            RowSpan::Content => row,
            RowSpan::FullWidth { margin } => {
                row.with_x_span((self.page.x0 + margin).min(row.x0), (self.page.x1 - margin).max(row.x1))
            },
        }
    }
}

/// Cluster all tokens of a page into rows.
///
/// Returns token indices per row. Rows run top to bottom (descending y, as in
/// PDF user space) and each row is sorted left to right. A token joins the
/// first existing row whose anchor, the row's first token, passes
/// [`same_row`]; otherwise it starts a new row.
pub fn group_rows(tokens: &[Token], tolerance: f32) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..tokens.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&tokens[a].bbox, &tokens[b].bbox);
        rb.mid_y().total_cmp(&ra.mid_y()).then(ra.x0.total_cmp(&rb.x0))
    });

    let mut rows: Vec<Vec<usize>> = Vec::new();
    for i in order {
        let bbox = &tokens[i].bbox;
        match rows
            .iter_mut()
            .find(|row| same_row(&tokens[row[0]].bbox, bbox, tolerance))
        {
            Some(row) => row.push(i),
            None => rows.push(vec![i]),
        }
    }

    for row in &mut rows {
        row.sort_by(|&a, &b| tokens[a].bbox.x0.total_cmp(&tokens[b].bbox.x0));
    }
    rows
}
