//! CLI entry point for mdx-article

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdx-article")]
#[command(version = "0.1.0")]
#[command(about = "Parse, check, format and render MDX blog articles", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog workspace
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new stub article
    New {
        /// Title of the new article
        title: String,

        /// Path for the new article, relative to the content directory
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Parse every article and report failures
    Check,

    /// Print the parsed record of an article as JSON
    Show {
        /// Article source file
        file: PathBuf,
    },

    /// Rewrite an article in canonical form
    Fmt {
        /// Article source file
        file: PathBuf,

        /// Overwrite the file instead of printing
        #[arg(short, long)]
        write: bool,
    },

    /// Render articles to HTML
    #[command(alias = "r")]
    Render {
        /// Article to render (defaults to all)
        file: Option<PathBuf>,
    },

    /// Clean the public folder
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdx_article=debug,info"
    } else {
        "mdx_article=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            mdx_article::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::New { title, path } => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            tracing::info!("Creating new article with title: {}", title);
            let created =
                mdx_article::commands::new::create_article(&blog, &title, path.as_deref())?;
            println!("Created {:?}", created);
        }

        Commands::Check => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            let summary = blog.check()?;
            for (path, message) in &summary.failures {
                eprintln!("{:?}: {}", path, message);
            }
            println!(
                "Checked {} article(s): {} stub(s), {} failure(s)",
                summary.articles,
                summary.stubs,
                summary.failures.len()
            );
            if !summary.is_ok() {
                anyhow::bail!("{} article(s) failed to check", summary.failures.len());
            }
        }

        Commands::Show { file } => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            println!("{}", mdx_article::commands::show::run(&blog, &base_dir.join(file))?);
        }

        Commands::Fmt { file, write } => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            let formatted = mdx_article::commands::fmt::run(&blog, &base_dir.join(file), write)?;
            if !write {
                print!("{}", formatted);
            }
        }

        Commands::Render { file } => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            let file = file.map(|f| base_dir.join(f));
            let written = mdx_article::commands::render::run(&blog, file.as_deref())?;
            println!("Rendered {} page(s)", written.len());
        }

        Commands::Clean => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = mdx_article::Blog::new(&base_dir)?;
            mdx_article::commands::list::run(&blog, &r#type)?;
        }

        Commands::Version => {
            println!("mdx-article version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
