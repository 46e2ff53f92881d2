//! pdfpage CLI - page-level PDF text tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfpage::{
    CaseSensitivity, Document, JsonFormat, LoadOptions, PageSelection, Rect, TextLayout,
};

#[derive(Parser)]
#[command(name = "pdfpage")]
#[command(version)]
#[command(about = "Page-level PDF text extraction, word boxes and search", long_about = None)]
struct Cli {
    /// Skip malformed page content instead of failing
    #[arg(long, global = true, env = "PDFPAGE_LENIENT")]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document and page information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Extract plain text
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Text layout
        #[arg(long, value_enum, default_value = "physical")]
        layout: LayoutMode,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Only text inside this rectangle: left,top,right,bottom in points
        /// from the top-left corner of the page
        #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
        rect: Option<Rect>,
    },

    /// Extract words with their boxes as JSON
    Words {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Find every occurrence of a phrase
    Search {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Text to look for
        #[arg(value_name = "QUERY")]
        query: String,

        /// Match regardless of case
        #[arg(short, long)]
        ignore_case: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutMode {
    /// Reading order, keeping columns aligned
    Physical,
    /// Content stream order
    Raw,
}

impl From<LayoutMode> for TextLayout {
    fn from(mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Physical => TextLayout::PhysicalLayout,
            LayoutMode::Raw => TextLayout::RawOrderLayout,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let lenient = cli.lenient;

    let result = match cli.command {
        Commands::Info { input } => cmd_info(&input, lenient),
        Commands::Text {
            input,
            output,
            layout,
            pages,
            rect,
        } => cmd_text(&input, output.as_deref(), layout, pages.as_deref(), rect, lenient),
        Commands::Words {
            input,
            output,
            pages,
            compact,
        } => cmd_words(&input, output.as_deref(), pages.as_deref(), compact, lenient),
        Commands::Search {
            input,
            query,
            ignore_case,
            pages,
        } => cmd_search(&input, &query, ignore_case, pages.as_deref(), lenient),
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

fn load_options(pages: Option<&str>, lenient: bool) -> Result<LoadOptions, Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p)?
    } else {
        PageSelection::All
    };

    let mut options = LoadOptions::new().with_pages(page_selection);
    if lenient {
        options = options.lenient();
    }
    Ok(options)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_info(input: &Path, lenient: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open_with_options(input, load_options(None, lenient)?)?;
    let metadata = doc.metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    println!(
        "{}: {}",
        "Linearized".bold(),
        if doc.header().linearized { "Yes" } else { "No" }
    );
    println!(
        "{}: {}",
        "Tagged".bold(),
        if metadata.tagged { "Yes" } else { "No" }
    );

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for page in doc.pages() {
        let (width, height) = page.size();
        let mut line = format!(
            "{:>4}  {:<8} {:.0} x {:.0} pt  {:?}",
            page.index() + 1,
            page.label(),
            width,
            height,
            page.orientation()
        );
        let duration = page.duration();
        if duration >= 0.0 {
            line.push_str(&format!("  {}s", duration));
        }
        if let Some(transition) = page.transition() {
            line.push_str(&format!("  {:?}", transition.kind));
        }
        println!("{}", line);
    }

    Ok(())
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    layout: LayoutMode,
    pages: Option<&str>,
    rect: Option<Rect>,
    lenient: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open_with_options(input, load_options(pages, lenient)?)?;
    let indices = doc.selected_indices();
    log::info!("extracting text from {} of {} pages", indices.len(), doc.page_count());

    let pb = if output.is_some() && indices.len() > 1 {
        let pb = ProgressBar::new(indices.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut texts = Vec::with_capacity(indices.len());
    for i in indices {
        let page = doc.page(i)?;
        pb.set_message(format!("page {}", page.label()));
        texts.push(page.text_with_layout(rect, layout.into())?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_output(output, &texts.join("\n\u{c}"))
}

fn cmd_words(
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
    compact: bool,
    lenient: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open_with_options(input, load_options(pages, lenient)?)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = pdfpage::export::to_json(&doc, format)?;
    write_output(output, &json)
}

fn cmd_search(
    input: &Path,
    query: &str,
    ignore_case: bool,
    pages: Option<&str>,
    lenient: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::open_with_options(input, load_options(pages, lenient)?)?;

    let case = if ignore_case {
        CaseSensitivity::CaseInsensitive
    } else {
        CaseSensitivity::CaseSensitive
    };

    let hits = doc.search_all(query, case)?;
    for (index, rect) in &hits {
        let label = doc.page(*index)?.label();
        println!(
            "{} {:<6} [{:.1}, {:.1}, {:.1}, {:.1}]",
            "page".dimmed(),
            label,
            rect.left,
            rect.top,
            rect.right,
            rect.bottom
        );
    }

    if hits.is_empty() {
        println!("{}", "No matches".yellow());
    } else {
        println!("\n{} {} matches", "Done!".green().bold(), hits.len());
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfpage".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Page-level PDF text extraction tool");
    println!();
    println!("License: MIT");
}

/// Parse `left,top,right,bottom`.
fn parse_rect(s: &str) -> Result<Rect, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid rectangle '{}': {}", s, e))?;

    match values.as_slice() {
        [left, top, right, bottom] => Ok(Rect::new(*left, *top, *right, *bottom)),
        _ => Err(format!("expected 4 comma-separated numbers, got '{}'", s)),
    }
}
