use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Import the library
use vast_ad_server::models::{AdData, GenerationConfig, MediaFile, TrackingEvents};
use vast_ad_server::server::{self, AppState};
use vast_ad_server::{create_vast_xml, store};

/// VAST ad server and document generator
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP ad server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,

        /// Tracking base URL; defaults to this server's own /events endpoint
        #[arg(long)]
        tracking_base_url: Option<String>,

        /// Path to a JSON ad description; a built-in sample ad is served otherwise
        #[arg(long)]
        ad_file: Option<PathBuf>,
    },

    /// Generate a single VAST document
    Generate {
        /// Tracking base URL embedded in the document
        #[arg(long)]
        tracking_base_url: String,

        /// Path to a JSON ad description; the built-in sample ad otherwise
        #[arg(long)]
        ad_file: Option<PathBuf>,

        /// Output file path (if not specified, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vast_ad_server=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            addr,
            tracking_base_url,
            ad_file,
        } => {
            let ad = load_ad(ad_file.as_deref()).await?;
            let tracking_base_url =
                tracking_base_url.unwrap_or_else(|| format!("http://{addr}/events"));
            let generation = GenerationConfig::new(tracking_base_url);

            // Reject a bad configuration before binding
            generation.validate()?;
            ad.validate()?;

            let state = AppState::new(store::in_memory_store(), generation, ad);
            server::serve(state, addr).await?;
        }
        Commands::Generate {
            tracking_base_url,
            ad_file,
            output,
        } => {
            let ad = load_ad(ad_file.as_deref()).await?;
            let xml = create_vast_xml(&GenerationConfig::new(tracking_base_url), &ad)?;

            if let Some(output_path) = output {
                tokio::fs::write(&output_path, &xml).await?;
                println!("VAST document written to {}", output_path.display());
            } else {
                println!("{xml}");
            }
        }
    }

    Ok(())
}

/// Load the ad description from a JSON file, or fall back to the sample ad.
async fn load_ad(path: Option<&Path>) -> anyhow::Result<AdData> {
    match path {
        Some(path) => {
            let content = tokio::fs::read_to_string(path).await?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(sample_ad()),
    }
}

/// Placeholder ad served until a real selection layer exists
fn sample_ad() -> AdData {
    AdData {
        id: "sample-ad-123".to_string(),
        title: "Sample Ad".to_string(),
        description: None,
        system: None,
        media_files: vec![MediaFile::new("https://example.com/sample-ad.mp4")],
        duration: "00:00:10".to_string(),
        click_through: None,
        click_tracking: Vec::new(),
        tracking_events: TrackingEvents::default(),
    }
}
