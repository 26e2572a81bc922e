//! Input checks that run before any request is sent.

use std::ops::RangeInclusive;

use aicreator_types::api::{GenerateImageRequest, LoginRequest, RegisterRequest, VideoJobRequest};

use crate::SyncError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Output sizes the image model accepts.
pub const IMAGE_SIZES: [(u32, u32); 5] = [
    (512, 512),
    (768, 768),
    (1024, 1024),
    (1024, 1536),
    (1536, 1024),
];

pub const CREATIVITY_RANGE: RangeInclusive<f32> = 0.0..=20.0;
pub const DURATION_RANGE: RangeInclusive<u32> = 1..=30;
pub const MAX_MOTION_INTENSITY: u8 = 100;

fn invalid(msg: &str) -> SyncError {
    SyncError::Validation(msg.to_string())
}

pub fn registration(req: &RegisterRequest) -> Result<(), SyncError> {
    profile_fields(&req.username, &req.email)?;
    password(&req.password)
}

pub fn login(req: &LoginRequest) -> Result<(), SyncError> {
    if req.username.trim().is_empty() {
        return Err(invalid("Username is required"));
    }
    if req.password.is_empty() {
        return Err(invalid("Password is required"));
    }
    Ok(())
}

pub fn profile(username: &str, email: &str, pass: &str) -> Result<(), SyncError> {
    profile_fields(username, email)?;
    password(pass)
}

fn profile_fields(username: &str, email: &str) -> Result<(), SyncError> {
    if username.trim().is_empty() {
        return Err(invalid("Username is required"));
    }
    if !is_valid_email(email) {
        return Err(invalid("Enter a valid email address"));
    }
    Ok(())
}

fn password(password: &str) -> Result<(), SyncError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SyncError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn image_request(req: &GenerateImageRequest) -> Result<(), SyncError> {
    if req.prompt.trim().is_empty() {
        return Err(invalid("Prompt must not be empty"));
    }
    if !IMAGE_SIZES.contains(&(req.width, req.height)) {
        return Err(SyncError::Validation(format!(
            "Unsupported image size {}x{}",
            req.width, req.height
        )));
    }
    if !CREATIVITY_RANGE.contains(&req.creativity_level) {
        return Err(SyncError::Validation(format!(
            "Creativity must be between {} and {}",
            CREATIVITY_RANGE.start(),
            CREATIVITY_RANGE.end()
        )));
    }
    Ok(())
}

pub fn video_request(req: &VideoJobRequest) -> Result<(), SyncError> {
    if !DURATION_RANGE.contains(&req.duration) {
        return Err(SyncError::Validation(format!(
            "Duration must be between {} and {} seconds",
            DURATION_RANGE.start(),
            DURATION_RANGE.end()
        )));
    }
    if req.motion_intensity > MAX_MOTION_INTENSITY {
        return Err(SyncError::Validation(format!(
            "Motion intensity must be at most {}",
            MAX_MOTION_INTENSITY
        )));
    }
    if !req.source_image_path.is_file() {
        return Err(invalid("Source image not found"));
    }
    Ok(())
}

/// Loose shape check: one `@`, something before it, a dotted domain after.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicreator_types::models::VideoStyle;

    fn register(username: &str, password: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            email: email.into(),
        }
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
    }

    #[test]
    fn registration_rules() {
        assert!(registration(&register("alice", "secret1", "a@x.com")).is_ok());
        assert!(registration(&register("  ", "secret1", "a@x.com")).is_err());
        assert!(registration(&register("alice", "12345", "a@x.com")).is_err());
        assert!(registration(&register("alice", "secret1", "nope")).is_err());
    }

    #[test]
    fn image_rules() {
        let mut req = GenerateImageRequest {
            user_id: 1,
            prompt: "a cat".into(),
            width: 1024,
            height: 1024,
            creativity_level: 7.0,
        };
        assert!(image_request(&req).is_ok());

        req.width = 1000;
        assert!(image_request(&req).is_err());
        req.width = 1024;

        req.creativity_level = 20.5;
        assert!(image_request(&req).is_err());
        req.creativity_level = 7.0;

        req.prompt = " ".into();
        assert_eq!(
            image_request(&req),
            Err(SyncError::Validation("Prompt must not be empty".into()))
        );
    }

    #[test]
    fn video_rules() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.jpg");
        std::fs::write(&source, b"jpg").unwrap();

        let mut req = VideoJobRequest {
            source_image_path: source,
            style: VideoStyle::Natural,
            duration: 5,
            motion_intensity: 50,
        };
        assert!(video_request(&req).is_ok());

        req.duration = 0;
        assert!(video_request(&req).is_err());
        req.duration = 31;
        assert!(video_request(&req).is_err());
        req.duration = 5;

        req.motion_intensity = 101;
        assert!(video_request(&req).is_err());
        req.motion_intensity = 100;

        req.source_image_path = dir.path().join("missing.jpg");
        assert!(video_request(&req).is_err());
    }
}
