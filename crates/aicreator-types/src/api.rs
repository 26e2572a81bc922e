use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::VideoStyle;

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

// -- Images --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    pub user_id: i64,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub creativity_level: f32,
}

// -- Videos --

/// Parameters of an image-to-video job. Sent as multipart form fields next
/// to the source image bytes, so this never goes over the wire as JSON.
#[derive(Debug, Clone)]
pub struct VideoJobRequest {
    pub source_image_path: PathBuf,
    pub style: VideoStyle,
    pub duration: u32,
    pub motion_intensity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Starting | Self::Processing)
    }
}

/// Model outputs come back either as a single URL or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    One(String),
    Many(Vec<String>),
}

impl PredictionOutput {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(url) => Some(url.as_str()),
            Self::Many(urls) => urls.first().map(String::as_str),
        }
    }
}

/// Asynchronous job descriptor returned by the model-execution endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Raw body of a video submission. Depending on the backend it carries a
/// direct `video_url` or a prediction descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoJobResponse {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<PredictionStatus>,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoSubmission {
    /// The media is ready to download.
    Ready { video_url: String },
    /// The backend accepted a job that has not produced a URL.
    Job(Prediction),
}

impl VideoJobResponse {
    /// Classify the body. Returns `None` when it carries neither a URL nor a
    /// job descriptor.
    pub fn into_submission(self) -> Option<VideoSubmission> {
        if let Some(video_url) = self.video_url {
            return Some(VideoSubmission::Ready { video_url });
        }

        let (id, status) = (self.id?, self.status?);
        if status.is_successful() {
            if let Some(url) = self.output.as_ref().and_then(PredictionOutput::first) {
                return Some(VideoSubmission::Ready {
                    video_url: url.to_string(),
                });
            }
        }

        Some(VideoSubmission::Job(Prediction {
            id,
            status,
            output: self.output,
            error: self.error,
        }))
    }
}
