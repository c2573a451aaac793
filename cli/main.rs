use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{Parser, Subcommand};
use postcraft::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "postcraft")]
#[command(about = "AI captions, bios, hashtags and image grids for social media", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate three captions for a photo and/or a description
    Captions {
        #[arg(short, long, help = "What the post is about")]
        prompt: Option<String>,

        #[arg(short, long, help = "Path to the photo")]
        image: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Mood::Casual)]
        mood: Mood,

        #[arg(short, long, value_enum, default_value_t = Length::Medium)]
        length: Length,
    },

    /// Generate three profile bios
    Bio {
        #[arg(short, long)]
        occupation: String,

        #[arg(short, long, help = "Interests (free text)")]
        interests: String,

        #[arg(short, long, value_enum)]
        personality: Personality,

        #[arg(long, help = "Leave emojis out of the bios")]
        no_emojis: bool,
    },

    /// Suggest hashtags grouped by reach
    Hashtags {
        #[arg(help = "Post content to tag")]
        content: String,

        #[arg(short, long)]
        niche: Option<String>,

        #[arg(short, long, help = "Target audience")]
        audience: Option<String>,
    },

    /// Describe a photo
    Analyze {
        #[arg(help = "Path to image file")]
        path: PathBuf,
    },

    /// Split a photo into grid tiles
    Grid {
        #[arg(help = "Path to image file")]
        path: PathBuf,

        #[arg(short, long, default_value_t = GridSize::ThreeByThree, help = "Grid layout: 2x2, 3x3, 1x3 or 3x1")]
        size: GridSize,

        #[arg(short, long, default_value = ".", help = "Directory for the tiles")]
        out: PathBuf,
    },

    /// List stored content of one type, newest first
    History {
        #[arg(help = "caption, bio, hashtags or grid")]
        content_type: String,
    },

    /// Delete a stored content record
    Delete { id: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::App(e.into())
    }
}

impl From<AiError> for CliError {
    fn from(e: AiError) -> Self {
        CliError::App(e.into())
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path).await.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn print_numbered(items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        println!("{}. {}", i + 1, item);
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let store = Store::connect(config.database_url.as_deref()).await?;
    let ai = AiClient::new(config.ai)?;

    match cli.command {
        Commands::Captions {
            prompt,
            image,
            mood,
            length,
        } => {
            let image_base64 = match image {
                Some(path) => Some(STANDARD.encode(read_file(&path).await?)),
                None => None,
            };

            let req = GenerateCaptionRequest {
                image_base64,
                image_url: None,
                prompt,
                mood,
                length,
            };
            let generated = generate_captions(&ai, &store, req).await?;

            print_numbered(&generated.payload);
            println!("saved as {}", generated.content_id);
        }
        Commands::Bio {
            occupation,
            interests,
            personality,
            no_emojis,
        } => {
            let req = GenerateBioRequest {
                occupation,
                interests,
                personality,
                include_emojis: !no_emojis,
            };
            let generated = generate_bio(&ai, &store, req).await?;

            print_numbered(&generated.payload);
            println!("saved as {}", generated.content_id);
        }
        Commands::Hashtags {
            content,
            niche,
            audience,
        } => {
            let req = GenerateHashtagsRequest {
                content,
                niche,
                target_audience: audience,
            };
            let generated = generate_hashtags(&ai, &store, req).await?;
            let hashtags = generated.payload;

            println!("high reach:   {}", hashtags.high_reach.join(" "));
            println!("medium reach: {}", hashtags.medium_reach.join(" "));
            println!("niche:        {}", hashtags.niche.join(" "));
            println!("saved as {}", generated.content_id);
        }
        Commands::Analyze { path } => {
            let bytes = read_file(&path).await?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let upload = analyze_upload(&ai, &bytes, filename).await?;
            println!("{}", upload.analysis);
        }
        Commands::Grid { path, size, out } => {
            let bytes = read_file(&path).await?;
            let req = GridConvertRequest {
                image_base64: STANDARD.encode(bytes),
                grid_size: size,
            };

            let generated = convert_grid(&store, req).await?;
            let split = generated.payload;
            let written = write_pieces(&split, &out)?;

            println!(
                "split into {} tiles of {}x{} pixels:",
                written.len(),
                split.piece_width,
                split.piece_height
            );
            for file in written {
                println!("  {}", file.display());
            }
            println!("saved as {}", generated.content_id);
        }
        Commands::History { content_type } => {
            let records = list_content(&store, &content_type).await?;
            if records.is_empty() {
                println!("no {content_type} content yet");
            }

            for record in records {
                println!(
                    "{}  {}  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.prompt.as_deref().unwrap_or("-")
                );
                println!("    {}", record.generated_content);
            }
        }
        Commands::Delete { id } => {
            remove_content(&store, &id).await?;
            println!("deleted {id}");
        }
    }

    Ok(())
}
