//! Folio CLI
//!
//! Content pipeline for a markdown/MDX blog.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Folio.
#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Build listings, rendered posts and a sitemap from a blog's content directory"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Render every post and write posts.json and sitemap.xml
    Build {
        /// Output directory (defaults to build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override site base URL (e.g., https://example.com)
        #[arg(long)]
        base_url: Option<String>,
        /// Fail if any post cannot be loaded or rendered
        #[arg(long)]
        strict: bool,
    },
    /// Print posts, newest first
    List {
        /// Only show posts carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Validate configuration and content
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Create a new post
    New {
        /// Slug (file name without extension)
        slug: String,
        /// Post title (derived from the slug if omitted)
        #[arg(short, long)]
        title: Option<String>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    folio::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            base_url,
            strict,
        } => {
            folio::cmd::build::run(
                &cli.config,
                output.as_deref(),
                base_url.as_deref(),
                strict,
            )?;
        }
        Commands::List { tag } => {
            folio::cmd::list::run(&cli.config, tag.as_deref())?;
        }
        Commands::Check { strict } => {
            folio::cmd::check::run(&cli.config, strict)?;
        }
        Commands::New { slug, title } => {
            folio::cmd::new::run(&cli.config, &slug, title.as_deref())?;
        }
    }

    Ok(())
}
