use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use aicreator_sync::App;
use aicreator_sync::repo::VideoGeneration;
use aicreator_sync::view::OpState;
use aicreator_types::models::{GeneratedImage, GeneratedVideo, VideoStyle};

pub async fn register(app: &App, username: &str, password: &str, email: &str) -> Result<()> {
    let user = app
        .user_view()
        .register(username, password, email)
        .join()
        .await?;
    println!("Registered {} (id {})", user.username, user.id);
    Ok(())
}

pub async fn login(app: &App, username: &str, password: &str) -> Result<()> {
    let view = app.user_view();
    view.login(username, password).join().await?;
    if let OpState::Ready(user) = view.auth.get() {
        println!("Welcome back, {}", user.username);
    }
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    match app.users.current_user().await? {
        Some(user) => {
            println!("{} <{}> (id {})", user.username, user.email, user.id);
            if let Some(at) = user.last_login {
                println!("last login: {}", at.to_rfc3339());
            }
        }
        None => println!("Not logged in"),
    }

    let prefs = app.session.preferences().await?;
    println!(
        "theme: {}, language: {}, notifications: {}",
        prefs.theme, prefs.language, prefs.notifications_enabled
    );
    Ok(())
}

pub async fn prefs(
    app: &App,
    theme: Option<String>,
    language: Option<String>,
    notifications: Option<bool>,
) -> Result<()> {
    if let Some(theme) = theme {
        app.session.set_theme(&theme).await?;
    }
    if let Some(language) = language {
        app.session.set_language(&language).await?;
    }
    if let Some(enabled) = notifications {
        app.session.set_notifications_enabled(enabled).await?;
    }
    whoami(app).await
}

pub async fn generate_image(
    app: &App,
    prompt: &str,
    size: (u32, u32),
    creativity: f32,
) -> Result<()> {
    let image = app
        .image_view()
        .generate(prompt, size, creativity)
        .join()
        .await?;
    println!("Generated image {}: {}", image.id, image.image_url);
    Ok(())
}

pub async fn images(
    app: &App,
    favorites: bool,
    recent: Option<u32>,
    search: Option<String>,
) -> Result<()> {
    let images = if let Some(limit) = recent {
        app.images.recent_images(limit).current().await?
    } else if let Some(query) = search {
        app.images.search(&query).current().await?
    } else {
        let user_id = app.session.require_user_id().await?;
        if favorites {
            app.images.favorite_images(user_id).current().await?
        } else {
            app.images.user_images(user_id).current().await?
        }
    };

    print_images(&images);
    Ok(())
}

pub async fn generate_video(
    app: &App,
    image: PathBuf,
    style: VideoStyle,
    duration: u32,
    motion: u8,
) -> Result<()> {
    let outcome = app
        .video_view()
        .generate(image, style, duration, motion)
        .join()
        .await?;

    match outcome {
        VideoGeneration::Saved(video) => {
            println!("Saved video {} to {}", video.id, video.video_path)
        }
        VideoGeneration::Pending { job_id, status } => {
            println!("Job {} accepted ({:?}); no video yet", job_id, status)
        }
    }
    Ok(())
}

pub async fn videos(app: &App, favorites: bool) -> Result<()> {
    let query = if favorites {
        app.videos.favorite_videos().await?
    } else {
        app.videos.user_videos().await?
    };
    print_videos(&query.current().await?);
    Ok(())
}

pub async fn watch_images(app: &App) -> Result<()> {
    let user_id = app.session.require_user_id().await?;
    let mut live = app.images.user_images(user_id);
    info!("Watching images of user {}; Ctrl+C to stop", user_id);

    loop {
        let snapshot = tokio::select! {
            snapshot = live.next() => snapshot,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(images) = snapshot else {
            break;
        };
        let images = images?;
        println!("--- {} image(s)", images.len());
        print_images(&images);
    }
    live.unsubscribe();
    Ok(())
}

fn print_images(images: &[GeneratedImage]) {
    if images.is_empty() {
        println!("(no images)");
    }
    for image in images {
        println!(
            "{:>6} {} {}  {}  {}",
            image.id,
            if image.is_favorite { "*" } else { " " },
            image.created_at.format("%Y-%m-%d %H:%M"),
            image.prompt,
            image.local_path.as_deref().unwrap_or(&image.image_url),
        );
    }
}

fn print_videos(videos: &[GeneratedVideo]) {
    if videos.is_empty() {
        println!("(no videos)");
    }
    for video in videos {
        println!(
            "{:>6} {} {}  {:<15} {:>2}s motion {:>3}  {}",
            video.id,
            if video.is_favorite { "*" } else { " " },
            video.created_at.format("%Y-%m-%d %H:%M"),
            video.video_style.to_string(),
            video.duration,
            video.motion_intensity,
            video.video_path,
        );
    }
}
