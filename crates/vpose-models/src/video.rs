//! Video identifiers and uploaded video payloads.

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Media type prefix every uploaded video must declare.
pub const VIDEO_MEDIA_TYPE_PREFIX: &str = "video/";

/// Fallback name for uploads whose original filename is missing or unusable.
const DEFAULT_UPLOAD_NAME: &str = "video";

/// Unique identifier for one uploaded video.
///
/// Every raw upload and all four derived artifacts of that upload are
/// namespaced by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A video received from a client, before it is written to the uploads area.
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    /// Raw file contents
    pub bytes: Bytes,
    /// Declared MIME type, as sent by the client
    pub content_type: Option<String>,
    /// Original filename, as sent by the client
    pub filename: Option<String>,
}

impl UploadedVideo {
    pub fn new(
        bytes: impl Into<Bytes>,
        content_type: Option<String>,
        filename: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
            filename,
        }
    }

    /// Whether the declared media type is a video type.
    pub fn is_video(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.get(..VIDEO_MEDIA_TYPE_PREFIX.len()))
            .map(|prefix| prefix.eq_ignore_ascii_case(VIDEO_MEDIA_TYPE_PREFIX))
            .unwrap_or(false)
    }

    /// Original filename reduced to a safe single path component.
    ///
    /// Only the last component is kept, and anything outside
    /// `[A-Za-z0-9._-]` becomes `_`.
    pub fn sanitized_filename(&self) -> String {
        let raw = self.filename.as_deref().unwrap_or_default();
        let last = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();

        let cleaned: String = last
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.trim_matches('.').is_empty() {
            DEFAULT_UPLOAD_NAME.to_string()
        } else {
            cleaned
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn upload(content_type: Option<&str>, filename: Option<&str>) -> UploadedVideo {
        UploadedVideo::new(
            Bytes::from_static(b"data"),
            content_type.map(str::to_string),
            filename.map(str::to_string),
        )
    }

    #[test]
    fn test_video_id_generation() {
        let id1 = VideoId::new();
        let id2 = VideoId::new();
        assert_ne!(id1, id2);
        assert!(Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn test_video_ids_are_unique_over_many_generations() {
        let ids: HashSet<VideoId> = (0..10_000).map(|_| VideoId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_is_video() {
        assert!(upload(Some("video/mp4"), None).is_video());
        assert!(upload(Some("Video/QuickTime"), None).is_video());
        assert!(!upload(Some("image/png"), None).is_video());
        assert!(!upload(Some("vid"), None).is_video());
        assert!(!upload(None, None).is_video());
    }

    #[test]
    fn test_sanitized_filename() {
        assert_eq!(upload(None, Some("squat.mp4")).sanitized_filename(), "squat.mp4");
        assert_eq!(
            upload(None, Some("../../etc/passwd")).sanitized_filename(),
            "passwd"
        );
        assert_eq!(
            upload(None, Some("C:\\clips\\my run.mov")).sanitized_filename(),
            "my_run.mov"
        );
        assert_eq!(upload(None, Some("..")).sanitized_filename(), "video");
        assert_eq!(upload(None, None).sanitized_filename(), "video");
    }
}
