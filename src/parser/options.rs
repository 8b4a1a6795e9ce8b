//! Parsing options and configuration.

/// Options for turning a report into sections.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to extract pages in parallel
    pub parallel: bool,

    /// Upper bound on extraction worker threads (0 = rayon default)
    pub max_workers: usize,

    /// Header/footer bands to drop from every page
    pub margins: PageMargins,

    /// Whether to run table detection
    pub detect_tables: bool,

    /// Minimum title-match confidence (0.0-1.0) for truncation
    pub title_match_threshold: f32,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on bookmarks that cannot be resolved.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Skip bookmarks that cannot be resolved.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel page extraction.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel page extraction.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Bound the number of extraction workers.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    /// Set header/footer crop margins.
    pub fn with_margins(mut self, margins: PageMargins) -> Self {
        self.margins = margins;
        self
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }

    /// Set the title-match confidence threshold.
    pub fn with_title_match_threshold(mut self, threshold: f32) -> Self {
        self.title_match_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            max_workers: 0,
            margins: PageMargins::none(),
            detect_tables: true,
            title_match_threshold: 0.6,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail when the outline cannot be read faithfully
    Strict,
    /// Skip unreadable bookmarks and continue
    #[default]
    Lenient,
}

/// Bands at the top and bottom of each page whose text is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageMargins {
    /// Points cut from the top edge
    pub top: f32,
    /// Points cut from the bottom edge
    pub bottom: f32,
}

impl PageMargins {
    /// No cropping.
    pub fn none() -> Self {
        Self::default()
    }

    /// The running header/footer crop used for exchange-filed annual reports.
    pub fn report_default() -> Self {
        Self {
            top: 80.0,
            bottom: 65.0,
        }
    }

    /// Whether any cropping is configured.
    pub fn is_none(&self) -> bool {
        self.top <= 0.0 && self.bottom <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .strict()
            .sequential()
            .with_max_workers(4)
            .with_margins(PageMargins::report_default())
            .with_tables(false)
            .with_title_match_threshold(1.5);

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(!options.parallel);
        assert_eq!(options.max_workers, 4);
        assert_eq!(options.margins.top, 80.0);
        assert_eq!(options.margins.bottom, 65.0);
        assert!(!options.detect_tables);
        assert_eq!(options.title_match_threshold, 1.0);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.parallel);
        assert!(options.detect_tables);
        assert!(options.margins.is_none());
    }
}
