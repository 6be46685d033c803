//! Layout analysis needed for highlighting: grouping tokens into rows.

pub mod rows;

pub use rows::{group_rows, same_row, RowGrouper};
