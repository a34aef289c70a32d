//! FFmpeg command builder and stream-copy trimming.

use std::path::{Path, PathBuf};

use tracing::info;
use vgrab_models::TrimRange;

use crate::command::ToolRunner;
use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Keep every stream of the input.
    pub fn map_all(self) -> Self {
        self.output_arg("-map").output_arg("0")
    }

    /// Copy codec data without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Shift timestamps so the output starts at zero.
    pub fn reset_timestamps(self) -> Self {
        self.output_arg("-avoid_negative_ts").output_arg("make_zero")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-v".to_string(),
            "error".to_string(),
        ];

        args.extend(self.input_args.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());

        args
    }
}

/// Build the stream-copy trim command for `range`.
pub fn trim_command(input: &Path, output: &Path, range: &TrimRange) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, output);
    if range.start_secs() > 0.0 {
        cmd = cmd.seek(range.start_secs());
    }
    if let Some(length) = range.length_secs() {
        cmd = cmd.duration(length);
    }
    cmd.map_all().codec_copy().reset_timestamps()
}

/// Cut `range` out of `input` into `output` without re-encoding.
pub async fn trim(runner: &ToolRunner, input: &Path, output: &Path, range: &TrimRange) -> MediaResult<()> {
    info!(
        input = %input.display(),
        output = %output.display(),
        start_secs = range.start_secs(),
        length_secs = ?range.length_secs(),
        "Trimming with stream copy"
    );

    let cmd = trim_command(input, output, range);
    runner.run(&cmd.build_args()).await?;

    if !tokio::fs::try_exists(output).await? {
        return Err(MediaError::OutputMissing {
            tool: runner.tool().name(),
            path: output.to_path_buf(),
        });
    }

    Ok(())
}
