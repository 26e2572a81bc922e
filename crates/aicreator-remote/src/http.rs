use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use aicreator_types::api::{
    GenerateImageRequest, LoginRequest, RegisterRequest, UpdateUserRequest, VideoJobRequest,
    VideoJobResponse, VideoSubmission,
};
use aicreator_types::models::{GeneratedImage, User};

use crate::{RemoteApi, RemoteError};

/// Fixed for every call; there is no per-request override.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest silence allowed between two reads. A body that keeps arriving
/// is never cut off, however long the whole transfer takes.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base of the CRUD API, e.g. `https://api.yourservice.com`.
    pub api_url: String,
    /// Full URL of the image-to-video submission endpoint.
    pub model_api_url: String,
}

/// [`RemoteApi`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    api_url: String,
    model_api_url: String,
}

impl HttpRemote {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        Self::with_read_timeout(config, READ_TIMEOUT)
    }

    fn with_read_timeout(config: RemoteConfig, read_timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model_api_url: config.model_api_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RemoteError> {
        let resp = send(req).await?;
        Ok(resp.json::<T>().await?)
    }
}

/// Send and turn any non-2xx into [`RemoteError::Rejected`] with the body text.
async fn send(req: RequestBuilder) -> Result<Response, RemoteError> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body
    };
    debug!("Remote rejected request ({}): {}", status, message);
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn register(&self, req: &RegisterRequest) -> Result<User, RemoteError> {
        debug!("POST /users/register username={}", req.username);
        self.send_json(self.client.post(self.url("/users/register")).json(req))
            .await
    }

    async fn login(&self, req: &LoginRequest) -> Result<User, RemoteError> {
        debug!("POST /users/login username={}", req.username);
        self.send_json(self.client.post(self.url("/users/login")).json(req))
            .await
    }

    async fn get_user(&self, id: i64) -> Result<User, RemoteError> {
        debug!("GET /users/{}", id);
        self.send_json(self.client.get(self.url(&format!("/users/{}", id))))
            .await
    }

    async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<User, RemoteError> {
        debug!("PUT /users/{}", id);
        self.send_json(self.client.put(self.url(&format!("/users/{}", id))).json(req))
            .await
    }

    async fn generate_image(
        &self,
        req: &GenerateImageRequest,
    ) -> Result<GeneratedImage, RemoteError> {
        debug!(
            "POST /images/generate user_id={} {}x{}",
            req.user_id, req.width, req.height
        );
        self.send_json(self.client.post(self.url("/images/generate")).json(req))
            .await
    }

    async fn user_images(&self, user_id: i64) -> Result<Vec<GeneratedImage>, RemoteError> {
        debug!("GET /images/user/{}", user_id);
        self.send_json(self.client.get(self.url(&format!("/images/user/{}", user_id))))
            .await
    }

    async fn recent_images(&self, limit: u32) -> Result<Vec<GeneratedImage>, RemoteError> {
        debug!("GET /images/recent?limit={}", limit);
        self.send_json(
            self.client
                .get(self.url("/images/recent"))
                .query(&[("limit", limit)]),
        )
        .await
    }

    async fn delete_image(&self, id: i64) -> Result<(), RemoteError> {
        debug!("DELETE /images/{}", id);
        send(self.client.delete(self.url(&format!("/images/{}", id)))).await?;
        Ok(())
    }

    async fn generate_video(
        &self,
        access_token: &str,
        req: &VideoJobRequest,
    ) -> Result<VideoSubmission, RemoteError> {
        let path = &req.source_image_path;
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let image = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.as_ref())?;
        let form = Form::new()
            .part("image", image)
            .text("style", req.style.as_str().to_string())
            .text("duration", req.duration.to_string())
            .text("motion_intensity", req.motion_intensity.to_string());

        debug!(
            "POST {} style={} duration={} motion={}",
            self.model_api_url, req.style, req.duration, req.motion_intensity
        );
        let body: VideoJobResponse = self
            .send_json(
                self.client
                    .post(&self.model_api_url)
                    .bearer_auth(access_token)
                    .multipart(form),
            )
            .await?;

        body.into_submission().ok_or_else(|| {
            RemoteError::Decode("response carries neither video_url nor a job".into())
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, RemoteError> {
        debug!("GET {} -> {}", url, dest.display());
        let resp = send(self.client.get(url)).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;

        match write_body(resp, &mut file).await {
            Ok(written) => Ok(written),
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!("Could not remove partial download {}: {}", dest.display(), rm);
                }
                Err(e)
            }
        }
    }
}

/// Stream the response body into `file`. Returns the bytes written.
async fn write_body(resp: Response, file: &mut tokio::fs::File) -> Result<u64, RemoteError> {
    let mut written: u64 = 0;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let data = chunk.map_err(|e| RemoteError::Network(format!("Stream error: {}", e)))?;
        file.write_all(&data).await?;
        written += data.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serves one response whose 40-byte body trickles out in 5-byte
    /// chunks, `gap` apart.
    async fn trickle_server(gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await.unwrap();
            let head = b"HTTP/1.1 200 OK\r\ncontent-length: 40\r\ncontent-type: video/mp4\r\n\r\n";
            if sock.write_all(head).await.is_err() {
                return;
            }
            for _ in 0..8 {
                if sock.write_all(b"abcde").await.is_err() {
                    return;
                }
                tokio::time::sleep(gap).await;
            }
        });
        format!("http://{}", addr)
    }

    fn remote(read_timeout: Duration) -> HttpRemote {
        HttpRemote::with_read_timeout(
            RemoteConfig {
                api_url: "http://127.0.0.1:1".into(),
                model_api_url: "http://127.0.0.1:1/video".into(),
            },
            read_timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn live_download_outlasts_read_timeout() {
        let base = trickle_server(Duration::from_millis(200)).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("v.mp4");

        // 8 chunks at 200 ms take well over the 500 ms read timeout in total.
        let written = remote(Duration::from_millis(500))
            .download(&format!("{}/v.mp4", base), &dest)
            .await
            .unwrap();
        assert_eq!(written, 40);
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcde".repeat(8));
    }

    #[tokio::test]
    async fn stalled_download_times_out_and_leaves_no_file() {
        let base = trickle_server(Duration::from_secs(5)).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("v.mp4");

        let err = remote(Duration::from_millis(300))
            .download(&format!("{}/v.mp4", base), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)), "got {:?}", err);
        assert!(!dest.exists());
    }
}
