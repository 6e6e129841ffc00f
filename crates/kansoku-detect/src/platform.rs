//! Capability checks used to pick an observation strategy at startup.

/// Whether filesystem access (open/close) events can be observed.
///
/// Only the inotify backend reports file opens; the other `notify` backends
/// see writes only, which never fire while a player is reading.
pub fn fs_events_supported() -> bool {
    #[cfg(target_os = "linux")]
    {
        true
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

/// Whether open file handles can be listed with `lsof`.
pub fn process_probe_supported() -> bool {
    cfg!(unix)
}
