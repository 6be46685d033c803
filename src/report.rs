//! Unmatched identifier report.

use crate::error::{Error, Result};

/// Column header used when none is configured.
pub const DEFAULT_REPORT_COLUMN: &str = "Unmatched_IDs";

/// Render unmatched identifiers as a one-column CSV.
///
/// Returns `None` when there is nothing to report.
pub fn unmatched_report(unmatched: &[String], column: &str) -> Result<Option<Vec<u8>>> {
    if unmatched.is_empty() {
        return Ok(None);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([column])?;
    for id in unmatched {
        writer.write_record([id])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_has_no_report() {
        assert!(unmatched_report(&[], DEFAULT_REPORT_COLUMN).unwrap().is_none());
    }

    #[test]
    fn test_report_contents() {
        let ids = vec!["A100".to_string(), "C,300".to_string()];
        let bytes = unmatched_report(&ids, DEFAULT_REPORT_COLUMN).unwrap().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Unmatched_IDs\nA100\n\"C,300\"\n");
    }

    #[test]
    fn test_custom_column() {
        let ids = vec!["X".to_string()];
        let bytes = unmatched_report(&ids, "Missing").unwrap().unwrap();
        assert!(bytes.starts_with(b"Missing\n"));
    }
}
