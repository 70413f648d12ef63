pub mod blockers;
pub mod generate;
pub mod health;

use visionproxy_core::models::{Platform, VideoRef};
use visionproxy_core::AppError;

/// Build a `VideoRef` from request fields; the platform defaults to YouTube.
fn video_ref(video_id: &str, platform: Option<&str>) -> Result<VideoRef, AppError> {
    let platform = platform
        .filter(|p| !p.trim().is_empty())
        .map(str::parse::<Platform>)
        .transpose()?
        .unwrap_or_default();
    VideoRef::new(platform, video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_defaults_to_youtube() {
        let video = video_ref("abc", None).unwrap();
        assert_eq!(video.platform, Platform::Youtube);
        assert_eq!(video_ref("abc", Some("")).unwrap().platform, Platform::Youtube);
        assert_eq!(
            video_ref("abc", Some("YouTube")).unwrap().platform,
            Platform::Youtube
        );
    }

    #[test]
    fn unsupported_platform_is_rejected() {
        assert!(matches!(
            video_ref("abc", Some("vimeo")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
