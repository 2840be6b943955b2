//! citeproc CLI - resolve, validate and render CSL styles

use anyhow::{Context, Result};
use citeproc::loader;
use citeproc::{
    Bibliography, Citation, CitationItem, Config, CslGrammar, DocumentSource, OutputFormat,
    PrimaryDialectTable, ReferenceLibrary, StyleLoader,
};
use citeproc_diagnostics::SourceFile;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "citeproc")]
#[command(version)]
#[command(about = "CSL style resolution and citation rendering", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./citeproc.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of .csl files to use as the external style catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Skip grammar validation of styles and locales
    #[arg(long, global = true)]
    no_validate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where a style identifier resolves to
    Resolve {
        /// Style name or path
        style: String,
    },

    /// Check a style or locale file against the CSL grammar
    Validate {
        file: PathBuf,
    },

    /// Render citations and a bibliography
    Render {
        /// Style name or path
        #[arg(short, long)]
        style: String,

        /// Locale tag (defaults to the style's default locale)
        #[arg(short, long)]
        locale: Option<String>,

        /// CSL-JSON file with the references
        #[arg(short, long)]
        references: PathBuf,

        /// Comma-separated keys of one citation; repeat for more citations
        #[arg(short, long = "cite")]
        cites: Vec<String>,

        /// Output format (html or plain)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Keep registration order instead of sorting the bibliography
        #[arg(long)]
        no_sort: bool,
    },
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citeproc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let outcome = run(&cli);
    match outcome {
        Ok(code) => Ok(code),
        Err(err) => match err.downcast_ref::<citeproc::Error>() {
            Some(citeproc_err) => {
                eprintln!("{}", citeproc_err.to_diagnostic().to_text(None));
                Ok(ExitCode::FAILURE)
            }
            None => Err(err),
        },
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };
    if let Some(catalog) = &cli.catalog {
        config.catalog_dir = Some(catalog.clone());
    }
    if cli.no_validate {
        config.validate = false;
    }
    let loader = config.style_loader();

    match &cli.command {
        Commands::Resolve { style } => resolve(&loader, style),
        Commands::Validate { file } => validate(file),
        Commands::Render {
            style,
            locale,
            references,
            cites,
            format,
            no_sort,
        } => render(
            &loader,
            &config,
            RenderArgs {
                style,
                locale: locale.as_deref(),
                references,
                cites,
                format: *format,
                sort: !no_sort,
            },
        ),
    }
}

fn resolve(loader: &StyleLoader, style: &str) -> Result<ExitCode> {
    let resolved = loader.resolver().resolve(style.into())?;
    match resolved.path() {
        Some(path) => println!("{}\t{}", resolved.provenance(), path.display()),
        None => println!("{}", resolved.provenance()),
    }
    Ok(ExitCode::SUCCESS)
}

fn validate(file: &Path) -> Result<ExitCode> {
    let loaded = loader::load(DocumentSource::Path(file.to_path_buf()), Some(&CslGrammar))?;
    let source = SourceFile::new(file.display().to_string(), loaded.value.text.clone());
    for warning in &loaded.warnings {
        eprintln!("{}", warning.to_diagnostic().to_text(Some(&source)));
    }

    let model = match loaded.value.xml.root.name.as_str() {
        "locale" => citeproc_csl::parse_locale(&loaded.value.xml).map(|_| ()),
        _ => citeproc_csl::parse_style(&loaded.value.xml).map(|_| ()),
    };
    if let Err(err) = model {
        eprintln!("{}", err.to_diagnostic().to_text(Some(&source)));
        return Ok(ExitCode::FAILURE);
    }

    println!("{}: {} warning(s)", file.display(), loaded.warnings.len());
    Ok(ExitCode::SUCCESS)
}

struct RenderArgs<'a> {
    style: &'a str,
    locale: Option<&'a str>,
    references: &'a Path,
    cites: &'a [String],
    format: Option<OutputFormat>,
    sort: bool,
}

fn render(loader: &StyleLoader, config: &Config, args: RenderArgs<'_>) -> Result<ExitCode> {
    let locale = args.locale.or(config.locale.as_deref());
    let style = loader.load(args.style, locale)?;
    for warning in style.warnings() {
        eprintln!("{}", warning.to_diagnostic().to_text(None));
    }
    let tag = style.locales().tag();
    let dialects = PrimaryDialectTable::bundled();
    tracing::info!(
        locale = tag,
        language = dialects.language_name(tag).unwrap_or(tag),
        "rendering with {}",
        style.title().unwrap_or(args.style)
    );

    let library = ReferenceLibrary::from_file(args.references)
        .with_context(|| format!("loading references from {}", args.references.display()))?;
    let format = args.format.unwrap_or(config.format);
    let mut bibliography = Bibliography::new(Arc::new(style), library, format);

    let mut report = |item: &CitationItem| {
        eprintln!("warning: no reference with key '{}'", item.key);
    };

    let mut citations = Vec::new();
    for group in args.cites {
        let keys = group.split(',').map(str::trim).filter(|k| !k.is_empty());
        let mut citation = Citation::of_keys(keys);
        bibliography.register(&mut citation, Some(&mut report));
        citations.push(citation);
    }

    for citation in &citations {
        println!("{}", bibliography.cite(citation, &mut |_| {})?);
    }

    if bibliography.style().has_bibliography() {
        if args.sort {
            bibliography.sort()?;
        }
        println!("{}", bibliography.bibliography()?);
    }
    Ok(ExitCode::SUCCESS)
}
