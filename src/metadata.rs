//! Document-level metadata discovery.
//!
//! Reports are filed as `<stock_code>_<company_name>_<year>.pdf`. The stock
//! code and company name come from that name; the report title comes from
//! the PDF information dictionary or the cover page.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{PageContent, PdfMetadata};

static FILE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<code>[^_]+)_(?P<name>.+)_(?P<year>\d{4})$").expect("Invalid file name regex")
});

static SUFFIXED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<digits>\d{1,6})\.(?P<exchange>SH|SZ|BJ)$").expect("Invalid suffixed code regex")
});

static PREFIXED_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<exchange>SH|SZ|BJ)(?P<digits>\d{6})$").expect("Invalid prefixed code regex")
});

/// Keywords that mark a cover line as the report title.
const TITLE_KEYWORDS: &[&str] = &["年度报告", "年报", "annual report"];

/// Cover lines longer than this are prose, not titles.
const MAX_TITLE_CHARS: usize = 80;

/// Characters not allowed in output file names.
const ILLEGAL_FILE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Fields recovered from the `<code>_<name>_<year>` naming convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNameInfo {
    /// Normalized stock code, e.g. `600519.SH`
    pub stock_code: Option<String>,
    /// Company short name
    pub company_name: Option<String>,
    /// Report year
    pub year: Option<u16>,
}

/// Parse a report path or file name against the naming convention.
///
/// Names that do not follow the convention yield an empty result.
pub fn parse_file_name<P: AsRef<Path>>(path: P) -> FileNameInfo {
    let stem = file_stem(path.as_ref());
    let Some(caps) = FILE_NAME_PATTERN.captures(&stem) else {
        return FileNameInfo::default();
    };

    let name = caps["name"].trim();
    FileNameInfo {
        stock_code: normalize_stock_code(&caps["code"]),
        company_name: (!name.is_empty()).then(|| name.to_string()),
        year: caps["year"].parse().ok(),
    }
}

/// Normalize a stock code to `<6 digits>.<SH|SZ|BJ>`.
///
/// Accepts bare codes (zero-padded to six digits, exchange inferred from
/// the prefix), suffixed codes (`600519.sh`) and prefixed codes
/// (`SH600519`). Returns `None` when the exchange cannot be determined.
pub fn normalize_stock_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();

    if let Some(caps) = SUFFIXED_CODE.captures(&code) {
        return Some(format!("{:0>6}.{}", &caps["digits"], &caps["exchange"]));
    }
    if let Some(caps) = PREFIXED_CODE.captures(&code) {
        return Some(format!("{}.{}", &caps["digits"], &caps["exchange"]));
    }
    if code.is_empty() || code.len() > 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{:0>6}", code);
    exchange_for(&digits).map(|exchange| format!("{}.{}", digits, exchange))
}

/// Exchange listing a six-digit code, inferred from its prefix.
pub fn exchange_for(code: &str) -> Option<&'static str> {
    if code.starts_with("92") {
        return Some("BJ");
    }
    match code.chars().next()? {
        '6' | '9' => Some("SH"),
        '0' | '2' | '3' => Some("SZ"),
        '4' | '8' => Some("BJ"),
        _ => None,
    }
}

/// Choose the report title.
///
/// In order: the information dictionary title, the first cover-page line
/// that names an annual report, `<company><year>年年度报告`, the file stem.
pub fn discover_report_title(
    info_title: Option<&str>,
    first_page: Option<&PageContent>,
    file_info: &FileNameInfo,
    stem: &str,
) -> String {
    if let Some(title) = info_title.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let cover_line = first_page.and_then(|page| {
        page.lines
            .iter()
            .map(|line| line.text.trim())
            .filter(|text| text.chars().count() <= MAX_TITLE_CHARS)
            .find(|text| {
                let lower = text.to_lowercase();
                TITLE_KEYWORDS.iter().any(|k| lower.contains(k))
            })
    });
    if let Some(line) = cover_line {
        return line.to_string();
    }

    match (&file_info.company_name, file_info.year) {
        (Some(company), Some(year)) => format!("{}{}年年度报告", company, year),
        _ => stem.to_string(),
    }
}

/// Assemble document metadata for a report file.
pub fn build_metadata<P: AsRef<Path>>(
    path: P,
    info_title: Option<&str>,
    first_page: Option<&PageContent>,
) -> PdfMetadata {
    let path = path.as_ref();
    let file_info = parse_file_name(path);
    let stem = file_stem(path);

    PdfMetadata {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        report_title: discover_report_title(info_title, first_page, &file_info, &stem),
        company_name: file_info.company_name.clone().unwrap_or_default(),
        company_stock_code: file_info.stock_code.clone().unwrap_or_default(),
    }
}

/// JSON output name for an input path: sanitized stem plus `.json`.
pub fn output_file_name<P: AsRef<Path>>(path: P) -> String {
    let stem: String = file_stem(path.as_ref())
        .chars()
        .map(|c| if ILLEGAL_FILE_CHARS.contains(&c) { '_' } else { c })
        .collect();
    format!("{}.json", stem)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
