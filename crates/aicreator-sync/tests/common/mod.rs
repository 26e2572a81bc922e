#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use aicreator_db::Database;
use aicreator_remote::{RemoteApi, RemoteError};
use aicreator_sync::{App, Config};
use aicreator_types::api::{
    GenerateImageRequest, LoginRequest, RegisterRequest, UpdateUserRequest, VideoJobRequest,
    VideoSubmission,
};
use aicreator_types::models::{GeneratedImage, User};

pub const IMAGE_URL: &str = "https://x/y.png";
pub const VIDEO_BYTES: &[u8] = b"fake-mp4-bytes";

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

/// In-memory backend that records every call.
pub struct FakeRemote {
    calls: Mutex<Vec<String>>,
    fail: Mutex<Option<RemoteError>>,
    fail_deletes: Mutex<Option<RemoteError>>,
    next_user_id: AtomicI64,
    next_image_id: AtomicI64,
    video: Mutex<VideoSubmission>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: Mutex::new(None),
            fail_deletes: Mutex::new(None),
            next_user_id: AtomicI64::new(1),
            next_image_id: AtomicI64::new(5),
            video: Mutex::new(VideoSubmission::Ready {
                video_url: "https://x/out.mp4".into(),
            }),
        }
    }

    /// Make every following call fail with `err`.
    pub fn fail_with(&self, err: RemoteError) {
        *self.fail.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.fail.lock().unwrap() = None;
    }

    pub fn fail_deletes(&self, err: RemoteError) {
        *self.fail_deletes.lock().unwrap() = Some(err);
    }

    pub fn answer_video(&self, submission: VideoSubmission) {
        *self.video.lock().unwrap() = submission;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(call);
        match self.fail.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn user(&self, id: i64, username: &str, email: &str) -> User {
        User {
            id,
            username: username.into(),
            // The backend does not echo passwords back.
            password: String::new(),
            email: email.into(),
            created_at: fixed_time(),
            last_login: None,
        }
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn register(&self, req: &RegisterRequest) -> Result<User, RemoteError> {
        self.record(format!("register {}", req.username))?;
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        Ok(self.user(id, &req.username, &req.email))
    }

    async fn login(&self, req: &LoginRequest) -> Result<User, RemoteError> {
        self.record(format!("login {}", req.username))?;
        Ok(self.user(1, &req.username, &format!("{}@x.com", req.username)))
    }

    async fn get_user(&self, id: i64) -> Result<User, RemoteError> {
        self.record(format!("get_user {}", id))?;
        Ok(self.user(id, "alice", "a@x.com"))
    }

    async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<User, RemoteError> {
        self.record(format!("update_user {}", id))?;
        Ok(self.user(id, &req.username, &req.email))
    }

    async fn generate_image(
        &self,
        req: &GenerateImageRequest,
    ) -> Result<GeneratedImage, RemoteError> {
        self.record(format!("generate_image {}", req.prompt))?;
        Ok(GeneratedImage {
            id: self.next_image_id.fetch_add(1, Ordering::SeqCst),
            user_id: req.user_id,
            prompt: req.prompt.clone(),
            image_url: IMAGE_URL.into(),
            local_path: None,
            created_at: fixed_time(),
            is_favorite: false,
        })
    }

    async fn user_images(&self, user_id: i64) -> Result<Vec<GeneratedImage>, RemoteError> {
        self.record(format!("user_images {}", user_id))?;
        Ok(Vec::new())
    }

    async fn recent_images(&self, limit: u32) -> Result<Vec<GeneratedImage>, RemoteError> {
        self.record(format!("recent_images {}", limit))?;
        Ok(Vec::new())
    }

    async fn delete_image(&self, id: i64) -> Result<(), RemoteError> {
        self.record(format!("delete_image {}", id))?;
        match self.fail_deletes.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn generate_video(
        &self,
        access_token: &str,
        req: &VideoJobRequest,
    ) -> Result<VideoSubmission, RemoteError> {
        self.record(format!("generate_video {} {}", access_token, req.style))?;
        Ok(self.video.lock().unwrap().clone())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, RemoteError> {
        self.record(format!("download {}", url))?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, VIDEO_BYTES).await?;
        Ok(VIDEO_BYTES.len() as u64)
    }
}

pub struct Harness {
    pub app: App,
    pub remote: Arc<FakeRemote>,
    pub dir: TempDir,
}

impl Harness {
    pub fn media_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("media")
    }

    /// A source image on disk for video requests.
    pub fn source_image(&self) -> std::path::PathBuf {
        let path = self.dir.path().join("source.jpg");
        std::fs::write(&path, b"jpg").unwrap();
        path
    }
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(Database::open(&dir.path().join("test.db")).unwrap());
    let remote = Arc::new(FakeRemote::new());
    let config = Config {
        db_path: dir.path().join("test.db"),
        media_dir: dir.path().join("media"),
        api_token: Some("tok-123".into()),
        ..Config::default()
    };
    let app = App::with_parts(db, remote.clone(), &config);
    Harness { app, remote, dir }
}

pub fn register_request(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.into(),
        password: "secret1".into(),
        email: format!("{}@x.com", username),
    }
}

pub fn login_request(username: &str) -> LoginRequest {
    LoginRequest {
        username: username.into(),
        password: "secret1".into(),
    }
}

pub fn image_request(user_id: i64, prompt: &str) -> GenerateImageRequest {
    GenerateImageRequest {
        user_id,
        prompt: prompt.into(),
        width: 1024,
        height: 1024,
        creativity_level: 7.0,
    }
}

/// Register and log in `alice` (id 1).
pub async fn logged_in(h: &Harness) -> User {
    h.app.users.register(register_request("alice")).await.unwrap();
    h.app.users.login(login_request("alice")).await.unwrap()
}
