//! JSON rendering for parsed reports.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::ParsedDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a parsed report.
///
/// Non-ASCII text (company names, titles, content) is written as-is, not
/// `\u` escaped.
pub fn to_json(doc: &ParsedDocument, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc)?,
        JsonFormat::Compact => serde_json::to_string(doc)?,
    };
    Ok(json)
}

/// Serialize a parsed report and write it to `path`.
pub fn write_json<P: AsRef<Path>>(doc: &ParsedDocument, path: P, format: JsonFormat) -> Result<()> {
    let json = to_json(doc, format)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PdfMetadata, Section};

    fn sample() -> ParsedDocument {
        let mut doc = ParsedDocument::new(PdfMetadata {
            file_name: "600519_贵州茅台_2023.pdf".to_string(),
            report_title: "贵州茅台2023年年度报告".to_string(),
            company_name: "贵州茅台".to_string(),
            company_stock_code: "600519.SH".to_string(),
        });
        doc.outline.push(Section::new("1", "第一节 重要提示", 1, "第一节 重要提示\n正文"));
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"pdf_metadata\""));
        assert!(json.contains("贵州茅台"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains("\n  "));
        assert!(json.starts_with("{\"pdf_metadata\":"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&sample(), &path, JsonFormat::Pretty).unwrap();

        let back: ParsedDocument = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.outline, sample().outline);
        assert_eq!(back.pdf_metadata, sample().pdf_metadata);
    }
}
