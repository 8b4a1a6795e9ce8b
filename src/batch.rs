//! Directory batch processing.
//!
//! Every PDF in the input directory is parsed and written to the output
//! directory as one JSON file. A file that cannot be opened is reported as
//! skipped and the run moves on; nothing aborts the batch once it started.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::detect::has_pdf_extension;
use crate::document::parse_file_with_options;
use crate::error::Result;
use crate::metadata::output_file_name;
use crate::model::Diagnostic;
use crate::parser::ParseOptions;
use crate::render::{write_json, JsonFormat};

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// JSON written with this many sections
    Parsed {
        /// Number of sections written
        sections: usize,
    },
    /// Not processed, or processed without usable output
    Skipped {
        /// Human-readable reason
        reason: String,
    },
}

/// Per-file summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Input path
    pub input: PathBuf,
    /// Output JSON path, when one was written
    pub output: Option<PathBuf>,
    /// What happened
    pub status: FileStatus,
    /// Number of pages skipped for lack of a text layer or extraction errors
    pub skipped_pages: usize,
}

impl FileReport {
    fn skipped(input: PathBuf, output: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            input,
            output,
            status: FileStatus::Skipped {
                reason: reason.into(),
            },
            skipped_pages: 0,
        }
    }

    /// Whether the file produced sections.
    pub fn is_parsed(&self) -> bool {
        matches!(self.status, FileStatus::Parsed { .. })
    }
}

/// Summary of a directory run, in input file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per PDF found
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Files that produced sections.
    pub fn parsed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_parsed()).count()
    }

    /// Files that were skipped.
    pub fn skipped_count(&self) -> usize {
        self.files.len() - self.parsed_count()
    }

    /// Total sections written across all files.
    pub fn total_sections(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Parsed { sections } => sections,
                FileStatus::Skipped { .. } => 0,
            })
            .sum()
    }
}

/// Parse every PDF in `input_dir` into `output_dir` with default options.
pub fn parse_directory<P, Q>(input_dir: P, output_dir: Q) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    parse_directory_with_options(input_dir, output_dir, &ParseOptions::default())
}

/// Parse every PDF in `input_dir` into `output_dir`.
///
/// Fails only when the input directory cannot be listed or the output
/// directory cannot be created.
pub fn parse_directory_with_options<P, Q>(
    input_dir: P,
    output_dir: Q,
    options: &ParseOptions,
) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    parse_directory_with_progress(input_dir, output_dir, options, |_| {})
}

/// Like [`parse_directory_with_options`], calling `on_file` as each file
/// finishes. Files may finish out of order when parsing in parallel; the
/// returned report is always in input order.
pub fn parse_directory_with_progress<P, Q, F>(
    input_dir: P,
    output_dir: Q,
    options: &ParseOptions,
    on_file: F,
) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    F: Fn(&FileReport) + Sync,
{
    let inputs = find_pdfs(input_dir.as_ref())?;
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    log::info!(
        "batch: {} PDF files from {} into {}",
        inputs.len(),
        input_dir.as_ref().display(),
        output_dir.display()
    );

    let run = |input: &PathBuf| {
        let report = process_file(input, output_dir, options);
        on_file(&report);
        report
    };

    let files: Vec<FileReport> = if options.parallel {
        inputs.par_iter().map(run).collect()
    } else {
        inputs.iter().map(run).collect()
    };

    let report = BatchReport { files };
    log::info!(
        "batch done: {} parsed, {} skipped",
        report.parsed_count(),
        report.skipped_count()
    );
    Ok(report)
}

/// PDF files directly inside `dir`, sorted by name.
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_pdf_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn process_file(input: &Path, output_dir: &Path, options: &ParseOptions) -> FileReport {
    let input_buf = input.to_path_buf();

    let document = match parse_file_with_options(input, options.clone()) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("skipping {}: {}", input.display(), e);
            return FileReport::skipped(input_buf, None, e.to_string());
        }
    };

    for diagnostic in &document.diagnostics {
        log::debug!("{}: {}", input.display(), diagnostic);
    }

    let output = output_dir.join(output_file_name(input));
    if let Err(e) = write_json(&document, &output, JsonFormat::Pretty) {
        log::warn!("could not write {}: {}", output.display(), e);
        return FileReport::skipped(input_buf, None, e.to_string());
    }

    let skipped_pages = document
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::PageSkipped { .. }))
        .count();

    if document.diagnostics.contains(&Diagnostic::EmptyOutline) {
        log::warn!("skipping {}: no outline entries", input.display());
        let mut report = FileReport::skipped(input_buf, Some(output), "no outline entries");
        report.skipped_pages = skipped_pages;
        return report;
    }

    FileReport {
        input: input_buf,
        output: Some(output),
        status: FileStatus::Parsed {
            sections: document.section_count(),
        },
        skipped_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pdfs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = find_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("broken.pdf"), b"not a pdf at all").unwrap();

        let report = parse_directory(input.path(), output.path()).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.parsed_count(), 0);
        assert_eq!(report.skipped_count(), 1);
        assert!(matches!(report.files[0].status, FileStatus::Skipped { .. }));
        assert!(report.files[0].output.is_none());
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_input_dir_fails() {
        let output = tempfile::tempdir().unwrap();
        let result = parse_directory("/nonexistent/reports", output.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            files: vec![
                FileReport {
                    input: "a.pdf".into(),
                    output: Some("a.json".into()),
                    status: FileStatus::Parsed { sections: 12 },
                    skipped_pages: 1,
                },
                FileReport::skipped("b.pdf".into(), None, "Document is encrypted"),
                FileReport {
                    input: "c.pdf".into(),
                    output: Some("c.json".into()),
                    status: FileStatus::Parsed { sections: 3 },
                    skipped_pages: 0,
                },
            ],
        };
        assert_eq!(report.parsed_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.total_sections(), 15);
    }
}
