use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque; stored exactly as the user typed it.
    #[serde(default)]
    pub password: String,
    pub email: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: i64,
    pub user_id: i64,
    pub prompt: String,
    pub image_url: String,
    /// Set once the image has been saved to the device.
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Videos only exist locally: the remote job hands back a URL, the file is
/// downloaded and the row is written with a local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    pub id: i64,
    pub user_id: i64,
    pub video_path: String,
    pub source_image_path: String,
    pub video_style: VideoStyle,
    /// Seconds.
    pub duration: u32,
    /// 0-100.
    pub motion_intensity: u8,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStyle {
    Natural,
    Cinematic,
    SlowMotion,
    FastTransition,
    Dreamy,
}

impl VideoStyle {
    pub const ALL: [VideoStyle; 5] = [
        VideoStyle::Natural,
        VideoStyle::Cinematic,
        VideoStyle::SlowMotion,
        VideoStyle::FastTransition,
        VideoStyle::Dreamy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Cinematic => "cinematic",
            Self::SlowMotion => "slow_motion",
            Self::FastTransition => "fast_transition",
            Self::Dreamy => "dreamy",
        }
    }
}

impl fmt::Display for VideoStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| format!("unknown video style: {}", s))
    }
}

/// Client-side settings kept next to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: String,
    pub language: String,
    pub notifications_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "light".into(),
            language: "zh-CN".into(),
            notifications_enabled: true,
        }
    }
}
