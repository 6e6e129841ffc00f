pub mod error;
pub mod fs_event;
pub mod media_server;
pub mod platform;
pub mod process;

use std::path::Path;

pub use error::DetectError;
pub use fs_event::{FsEventWatcher, WatchWake};
pub use media_server::{MediaServer, MediaServerConfig, MediaServerStatus, PlexClient, PlexSession};
pub use process::{FileProbe, ProcessProbe};

/// Container extensions that count as "a video is playing".
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi"];

/// Check whether a path ends in one of [`VIDEO_EXTENSIONS`] (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Base filename of a path, as reported to the recognition pipeline.
pub fn base_filename(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extensions() {
        assert!(is_video_file(Path::new("/tmp/show - 01.mkv")));
        assert!(is_video_file(Path::new("/tmp/SHOW - 01.MP4")));
        assert!(is_video_file(Path::new("clip.avi")));
        assert!(!is_video_file(Path::new("/tmp/show - 01.mkv.part")));
        assert!(!is_video_file(Path::new("/tmp/subs.ass")));
        assert!(!is_video_file(Path::new("/tmp/noext")));
    }

    #[test]
    fn test_base_filename() {
        assert_eq!(
            base_filename(Path::new("/media/anime/[Group] Show - 02.mkv")).as_deref(),
            Some("[Group] Show - 02.mkv")
        );
    }
}
