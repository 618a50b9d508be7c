//! CLI entry point for hoshinonaka

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hoshinonaka")]
#[command(author = "Hoshinonaka/Snak")]
#[command(version)]
#[command(about = "The Hoshinonaka government website", long_about = None)]
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
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Import markdown content into the store
    Import,

    /// List stored content
    List {
        /// Type of content to list (articles, bureaus)
        #[arg(default_value = "articles")]
        r#type: String,
    },

    /// Render a markdown file to sanitized HTML
    Render {
        /// Markdown file, or `-` for stdin
        file: PathBuf,
    },

    /// Start the web server
    #[command(aliases = ["server", "s"])]
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to the configured address)
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "hoshinonaka=debug,tower_http=debug,info"
    } else {
        "hoshinonaka=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

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
            tracing::info!("Initializing site in {:?}", target_dir);
            hoshinonaka::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Import => {
            let site = hoshinonaka::Site::new(&base_dir)?;
            let report = site.import()?;
            println!(
                "Bureaus: {} created, {} updated. Articles: {} created, {} updated. {} unchanged, {} skipped.",
                report.bureaus_created,
                report.bureaus_updated,
                report.articles_created,
                report.articles_updated,
                report.unchanged,
                report.skipped
            );
        }

        Commands::List { r#type } => {
            let site = hoshinonaka::Site::new(&base_dir)?;
            hoshinonaka::commands::list::run(&site, &r#type)?;
        }

        Commands::Render { file } => {
            hoshinonaka::commands::render::run(&file)?;
        }

        Commands::Serve { port, ip } => {
            let site = hoshinonaka::Site::new(&base_dir)?;
            let ip = ip.unwrap_or_else(|| site.config.ip.clone());
            let port = port.unwrap_or(site.config.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            hoshinonaka::server::start(&site, &ip, port).await?;
        }

        Commands::Version => {
            println!("hoshinonaka version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
