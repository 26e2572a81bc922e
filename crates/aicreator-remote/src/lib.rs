//! Remote Client: a stateless request/response wrapper over the backend's
//! CRUD API and the model-execution endpoint.
//!
//! One request, one response. There is no job polling, no retry and no
//! token refresh here; callers get either the decoded payload or a
//! [`RemoteError`] describing why there is none.

pub mod error;
pub mod http;

use std::path::Path;

use async_trait::async_trait;

use aicreator_types::api::{
    GenerateImageRequest, LoginRequest, RegisterRequest, UpdateUserRequest, VideoJobRequest,
    VideoSubmission,
};
use aicreator_types::models::{GeneratedImage, User};

pub use error::RemoteError;
pub use http::{HttpRemote, RemoteConfig};

#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// POST /users/register
    async fn register(&self, req: &RegisterRequest) -> Result<User, RemoteError>;

    /// POST /users/login
    async fn login(&self, req: &LoginRequest) -> Result<User, RemoteError>;

    /// GET /users/{id}
    async fn get_user(&self, id: i64) -> Result<User, RemoteError>;

    /// PUT /users/{id}
    async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<User, RemoteError>;

    /// POST /images/generate
    async fn generate_image(&self, req: &GenerateImageRequest)
    -> Result<GeneratedImage, RemoteError>;

    /// GET /images/user/{user_id}
    async fn user_images(&self, user_id: i64) -> Result<Vec<GeneratedImage>, RemoteError>;

    /// GET /images/recent?limit=N
    async fn recent_images(&self, limit: u32) -> Result<Vec<GeneratedImage>, RemoteError>;

    /// DELETE /images/{id}
    async fn delete_image(&self, id: i64) -> Result<(), RemoteError>;

    /// Multipart submission to the model-execution endpoint.
    async fn generate_video(
        &self,
        access_token: &str,
        req: &VideoJobRequest,
    ) -> Result<VideoSubmission, RemoteError>;

    /// Stream `url` into `dest`. Returns the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, RemoteError>;
}
