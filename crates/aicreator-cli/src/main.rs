//! AI Creator command line.
//!
//! Each command stands in for one screen of the app: it drives the same
//! view models and repositories and prints what a screen would show.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use aicreator_sync::{App, Config, SyncError};
use aicreator_types::models::VideoStyle;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "aicreator")]
#[command(about = "AI Creator - generate and manage images and videos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and remember the session
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the session and preferences
    Logout,
    /// Show the logged-in user and preferences
    Whoami,
    /// Show or change preferences
    Prefs {
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        notifications: Option<bool>,
    },
    /// Generate an image from a text prompt
    GenerateImage {
        prompt: String,
        #[arg(long, default_value_t = 1024)]
        width: u32,
        #[arg(long, default_value_t = 1024)]
        height: u32,
        #[arg(long, default_value_t = 7.0)]
        creativity: f32,
    },
    /// List stored images
    Images {
        /// Only favorites of the session user
        #[arg(long)]
        favorites: bool,
        /// Newest N images of every user
        #[arg(long, conflicts_with_all = ["favorites", "search"])]
        recent: Option<u32>,
        /// Prompt substring
        #[arg(long, conflicts_with = "favorites")]
        search: Option<String>,
    },
    /// Mark an image as favorite (or unmark with --off)
    FavoriteImage {
        id: i64,
        #[arg(long)]
        off: bool,
    },
    DeleteImage {
        id: i64,
    },
    /// Turn a local image into a video
    GenerateVideo {
        image: PathBuf,
        #[arg(long, default_value = "natural")]
        style: VideoStyle,
        #[arg(long, default_value_t = 5)]
        duration: u32,
        #[arg(long, default_value_t = 50)]
        motion: u8,
    },
    /// List the session user's videos
    Videos {
        #[arg(long)]
        favorites: bool,
    },
    FavoriteVideo {
        id: i64,
        #[arg(long)]
        off: bool,
    },
    DeleteVideo {
        id: i64,
    },
    /// Print the session user's images after every change, until Ctrl+C
    WatchImages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aicreator=info".into()),
        )
        .init();

    let app = App::open(&config)?;
    let result = run(&app, cli.command).await;
    app.shutdown().await;

    if let Err(e) = result {
        match e.downcast_ref::<SyncError>() {
            Some(sync) => eprintln!("Error: {}", sync.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => commands::register(app, &username, &password, &email).await,
        Commands::Login { username, password } => {
            commands::login(app, &username, &password).await
        }
        Commands::Logout => {
            app.users.logout().await?;
            info!("Logged out");
            Ok(())
        }
        Commands::Whoami => commands::whoami(app).await,
        Commands::Prefs {
            theme,
            language,
            notifications,
        } => commands::prefs(app, theme, language, notifications).await,
        Commands::GenerateImage {
            prompt,
            width,
            height,
            creativity,
        } => commands::generate_image(app, &prompt, (width, height), creativity).await,
        Commands::Images {
            favorites,
            recent,
            search,
        } => commands::images(app, favorites, recent, search).await,
        Commands::FavoriteImage { id, off } => {
            app.image_view().set_favorite(id, !off).join().await?;
            Ok(())
        }
        Commands::DeleteImage { id } => {
            app.image_view().delete(id).join().await?;
            Ok(())
        }
        Commands::GenerateVideo {
            image,
            style,
            duration,
            motion,
        } => commands::generate_video(app, image, style, duration, motion).await,
        Commands::Videos { favorites } => commands::videos(app, favorites).await,
        Commands::FavoriteVideo { id, off } => {
            app.video_view().set_favorite(id, !off).join().await?;
            Ok(())
        }
        Commands::DeleteVideo { id } => {
            app.video_view().delete(id).join().await?;
            Ok(())
        }
        Commands::WatchImages => commands::watch_images(app).await,
    }
}
