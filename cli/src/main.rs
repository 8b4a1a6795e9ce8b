//! unreport CLI - annual report section extraction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unreport::batch::find_pdfs;
use unreport::metadata::build_metadata;
use unreport::render::{to_json, JsonFormat};
use unreport::{
    parse_directory_with_progress, parse_file_with_options, read_outline, FileStatus, PageMargins,
    PageSource, ParseOptions, PdfParser,
};

#[derive(Parser)]
#[command(name = "unreport")]
#[command(version)]
#[command(about = "Rebuild PDF annual reports into section JSON", long_about = None)]
struct Cli {
    #[command(flatten)]
    parse: ParseArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ParseArgs {
    /// Drop running headers and footers before assembling sections
    #[arg(long, global = true, env = "UNREPORT_CROP_MARGINS")]
    crop_margins: bool,

    /// Page extraction worker threads (0 = one per core)
    #[arg(long, global = true, env = "UNREPORT_WORKERS", default_value = "0")]
    workers: usize,

    /// Fail on bookmarks whose destination cannot be resolved
    #[arg(long, global = true)]
    strict: bool,
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        let mut options = ParseOptions::new().with_max_workers(self.workers);
        if self.crop_margins {
            options = options.with_margins(PageMargins::report_default());
        }
        if self.strict {
            options = options.strict();
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one report into section JSON
    Parse {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Parse every PDF in a directory
    Batch {
        /// Directory containing PDF reports
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Directory receiving one JSON per report
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,
    },

    /// Print the resolved outline tree
    Outline {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let options = cli.parse.options();

    let result = match cli.command {
        Commands::Parse {
            input,
            output,
            compact,
        } => cmd_parse(&input, output.as_deref(), compact, options),
        Commands::Batch { input, output } => cmd_batch(&input, &output, options),
        Commands::Outline { input } => cmd_outline(&input, options),
        Commands::Info { input } => cmd_info(&input, options),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    options: ParseOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = parse_file_with_options(input, options)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = to_json(&doc, format)?;

    for diagnostic in &doc.diagnostics {
        eprintln!("{} {}", "warning:".yellow(), diagnostic);
    }

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!(
            "{} {} ({} sections)",
            "Saved to".green(),
            path.display(),
            doc.section_count()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    options: ParseOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = find_pdfs(input)?.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = parse_directory_with_progress(input, output, &options, |file| {
        let name = file
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name);
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    println!("{}", "Batch Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for file in &report.files {
        let name = file.input.display();
        match &file.status {
            FileStatus::Parsed { sections } => {
                let pages = if file.skipped_pages > 0 {
                    format!(", {} pages skipped", file.skipped_pages)
                } else {
                    String::new()
                };
                println!("  {} {} ({} sections{})", "✓".green(), name, sections, pages);
            }
            FileStatus::Skipped { reason } => {
                println!("  {} {} ({})", "✗".yellow(), name, reason.dimmed());
            }
        }
    }

    println!(
        "\n{} {} parsed, {} skipped, {} sections",
        "Done!".green().bold(),
        report.parsed_count(),
        report.skipped_count(),
        report.total_sections()
    );

    Ok(())
}

fn cmd_outline(input: &Path, options: ParseOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (tree, diagnostics) = read_outline(input, options)?;

    if tree.is_empty() {
        println!("{}", "No outline entries".yellow());
    } else {
        print!("{}", tree.render());
    }

    for diagnostic in &diagnostics {
        eprintln!("{} {}", "warning:".yellow(), diagnostic);
    }

    Ok(())
}

fn cmd_info(input: &Path, options: ParseOptions) -> Result<(), Box<dyn std::error::Error>> {
    let parser = PdfParser::open_with_options(input, options)?;
    let info_title = parser.info_title();
    let metadata = build_metadata(input, info_title.as_deref(), None);
    let outline = parser.outline_entries()?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), parser.version());
    println!("{}: {}", "Pages".bold(), parser.page_count());
    println!("{}: {}", "Title".bold(), metadata.report_title);

    if !metadata.company_name.is_empty() {
        println!("{}: {}", "Company".bold(), metadata.company_name);
    }
    if !metadata.company_stock_code.is_empty() {
        println!("{}: {}", "Stock Code".bold(), metadata.company_stock_code);
    }

    println!("{}: {}", "Bookmarks".bold(), outline.entries.len());
    if !outline.diagnostics.is_empty() {
        println!(
            "{}: {}",
            "Unresolved".bold(),
            outline.diagnostics.len().to_string().yellow()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unreport".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Annual report section extraction tool");
    println!();
    println!("License: MIT");
}
