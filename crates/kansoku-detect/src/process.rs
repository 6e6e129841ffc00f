use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::DetectError;
use crate::{base_filename, is_video_file};

/// Default open-file listing tool.
const LSOF: &str = "lsof";

/// A source that reports which video file is currently open.
pub trait FileProbe: Send {
    /// Base filename of the open video, or `None` when nothing is playing.
    fn playing_file(&mut self) -> impl Future<Output = Result<Option<String>, DetectError>> + Send;
}

/// Finds the playing file by listing handles of processes matching a name.
///
/// Runs `lsof -n -c /<process_name>/ -Fn`, so `process_name` is an lsof
/// command regex (e.g. `mpv|vlc|mplayer`).
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    process_name: String,
    program: String,
}

impl ProcessProbe {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            program: LSOF.to_string(),
        }
    }

    /// Use another listing binary. It must accept lsof's arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }
}

impl FileProbe for ProcessProbe {
    async fn playing_file(&mut self) -> Result<Option<String>, DetectError> {
        let command_filter = format!("/{}/", self.process_name);
        // lsof exits 1 when nothing matched; only a spawn failure is an error.
        let output = Command::new(&self.program)
            .args(["-n", "-c", command_filter.as_str(), "-Fn"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| DetectError::Launch {
                tool: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let playing = parse_lsof_output(&stdout);
        debug!(process = %self.process_name, file = ?playing, "Probed open files");
        Ok(playing)
    }
}

/// Pick the first video file out of `lsof -Fn` output.
///
/// Name records start with `n`; every other field type is ignored.
pub fn parse_lsof_output(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix('n'))
        .map(Path::new)
        .find(|path| is_video_file(path))
        .and_then(base_filename)
}
