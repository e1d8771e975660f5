use std::path::Path;

use crate::apndb::{parse_apn_line, ApnRecord};

use super::super::error::CliError;
use super::super::formatting::{format_header, format_muted};

/// Parses every non-comment, non-blank line of an APN database file.
///
/// Lines starting with `#` and blank lines are skipped, matching the
/// comment convention of the plain-text database this format was lifted
/// from. The line number in any [`CliError::ApnLine`] is 1-indexed against
/// the raw file, not the filtered list, so it points at the right line in
/// an editor.
pub fn load_database(path: &Path) -> Result<Vec<ApnRecord>, CliError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| CliError::ReadFile { path: path.display().to_string(), source })?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            parse_apn_line(line).map_err(|source| CliError::ApnLine {
                path: path.display().to_string(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

pub fn render(records: &[ApnRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format_header(&format!("{} apn entries", records.len())));
    out.push('\n');
    if records.is_empty() {
        out.push_str(&format!("  {}\n", format_muted("none")));
        return out;
    }
    for record in records {
        out.push_str(&format!(
            "  {:<24} {:<20} {}{}\n",
            record.carrier, record.profile.apn, record.mcc, record.mnc
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let file = write_file(
            "# a comment\n\nV5,Carrier,internet,,,,,,,,310,260,0,default,IP,IP,1,0,0,0,0,0,0,1500,none,,0,0\n",
        );
        let records = load_database(file.path()).expect("parses");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].carrier, "Carrier");
    }

    #[test]
    fn reports_one_indexed_line_number_on_bad_entry() {
        let file = write_file("# header\nV5,C,apn,,,,,,,,,310,260,0,bogus,IP,IP,1,0,0,0,0,0,0,1500,none,,0,0\n");
        let err = load_database(file.path()).expect_err("rejects bad apn type");
        match err {
            CliError::ApnLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_database(Path::new("/nonexistent/apns.conf")).expect_err("missing file");
        assert!(matches!(err, CliError::ReadFile { .. }));
    }
}
