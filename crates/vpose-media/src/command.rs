//! Command-line analysis runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::processor::{ProcessorOutputs, VideoProcessor};

/// Number of stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Configuration of the external analysis command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Program to run, looked up on PATH unless it is a path
    pub program: String,
    /// Arguments placed before the input/output flags
    pub args: Vec<String>,
    /// Kill the analysis after this long
    pub timeout: Option<Duration>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["core/pose_cli.py".to_string()],
            timeout: None,
        }
    }
}

impl ProcessorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program: std::env::var("PROCESSOR_PROGRAM").unwrap_or(defaults.program),
            args: std::env::var("PROCESSOR_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.args),
            timeout: std::env::var("PROCESSOR_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Builder for one analysis invocation.
#[derive(Debug, Clone)]
pub struct PoseCommand {
    /// Input video path
    input: PathBuf,
    /// Output paths
    outputs: ProcessorOutputs,
    /// Arguments before the input/output flags
    prefix_args: Vec<String>,
}

impl PoseCommand {
    pub fn new(input: impl AsRef<Path>, outputs: ProcessorOutputs) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            outputs,
            prefix_args: Vec::new(),
        }
    }

    /// Add arguments placed before the input/output flags.
    pub fn prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.prefix_args.clone();

        let flags: [(&str, &Path); 5] = [
            ("--video-path", &self.input),
            ("--plot-path", &self.outputs.plot),
            ("--elipsis-path", &self.outputs.elipsis),
            ("--analyze-path", &self.outputs.analysis),
            ("--save-path", &self.outputs.json_result),
        ];
        for (flag, path) in flags {
            args.push(flag.to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args
    }
}

/// Runs the analysis as a child process.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    config: ProcessorConfig,
}

impl CommandProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Wait for the child, killing it if the timeout expires.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let Some(timeout) = self.config.timeout else {
            return Ok(child.wait().await?);
        };

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        match waited {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!(
                    "Analysis timed out after {} seconds, killing process",
                    timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out analysis: {}", e);
                }
                Err(MediaError::Timeout(timeout.as_secs()))
            }
        }
    }
}

#[async_trait]
impl VideoProcessor for CommandProcessor {
    async fn process_video(&self, input: &Path, outputs: &ProcessorOutputs) -> MediaResult<()> {
        if !tokio::fs::metadata(input).await.map(|m| m.is_file()).unwrap_or(false) {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }

        let program = check_processor(&self.config.program)?;
        let args = PoseCommand::new(input, outputs.clone())
            .prefix_args(self.config.args.iter().cloned())
            .build_args();
        debug!("Running analysis: {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stdout_handle = tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "vpose::processor", "{}", line);
                }
            }
        });

        let stderr = child.stderr.take();
        let stderr_handle = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "vpose::processor", "{}", line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            Vec::from(tail).join("\n")
        });

        let status = match self.wait_for_completion(&mut child).await {
            Ok(status) => status,
            Err(e) => {
                stdout_handle.abort();
                stderr_handle.abort();
                return Err(e);
            }
        };

        let _ = stdout_handle.await;
        let stderr_tail = stderr_handle.await.unwrap_or_default();

        if !status.success() {
            let last_line = stderr_tail
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no error output");
            return Err(MediaError::processor_failed(
                format!("{} exited with {}: {}", self.config.program, status, last_line),
                Some(stderr_tail.clone()),
                status.code(),
            ));
        }

        verify_outputs(outputs).await?;
        info!("Analysis finished for {}", input.display());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.program
    }
}

/// Every output must exist as a non-empty file.
async fn verify_outputs(outputs: &ProcessorOutputs) -> MediaResult<()> {
    for path in outputs.paths() {
        let produced = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(MediaError::MissingOutput(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Check if the analysis program is available.
pub fn check_processor(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::ProcessorNotFound(program.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outputs_in(dir: &Path) -> ProcessorOutputs {
        ProcessorOutputs::new(
            dir.join("id_plot.png"),
            dir.join("id_elipsis.png"),
            dir.join("id_analysis.txt"),
            dir.join("id_result.json"),
        )
    }

    #[test]
    fn test_command_builder() {
        let cmd = PoseCommand::new("in.mp4", outputs_in(Path::new("out")))
            .prefix_args(["core/pose_cli.py"]);

        let args = cmd.build_args();
        assert_eq!(args[0], "core/pose_cli.py");
        assert_eq!(args[1], "--video-path");
        assert_eq!(args[2], "in.mp4");
        assert!(args.contains(&"--elipsis-path".to_string()));
        assert!(args.contains(&"out/id_result.json".to_string()));
        assert_eq!(args.len(), 11);
    }

    #[test]
    fn test_command_flags_are_fixed() {
        let dir = Path::new("out");
        let args = PoseCommand::new("in.mp4", outputs_in(dir)).build_args();

        let expected: Vec<String> = vec![
            "--video-path".to_string(),
            "in.mp4".to_string(),
            "--plot-path".to_string(),
            dir.join("id_plot.png").to_string_lossy().to_string(),
            "--elipsis-path".to_string(),
            dir.join("id_elipsis.png").to_string_lossy().to_string(),
            "--analyze-path".to_string(),
            dir.join("id_analysis.txt").to_string_lossy().to_string(),
            "--save-path".to_string(),
            dir.join("id_result.json").to_string_lossy().to_string(),
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_missing_program() {
        let result = check_processor("definitely-not-a-real-analysis-program");
        assert!(matches!(result, Err(MediaError::ProcessorNotFound(_))));
    }

    #[cfg(unix)]
    mod shell {
        use super::*;

        /// Writes every `--*-path` target except the video.
        const WRITE_ALL: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --video-path) ;;
    *) printf 'out' > "$2" ;;
  esac
  shift 2
done
"#;

        fn shell_processor(script: &str, timeout: Option<Duration>) -> CommandProcessor {
            CommandProcessor::new(ProcessorConfig {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "pose".to_string()],
                timeout,
            })
        }

        async fn input_in(dir: &TempDir) -> PathBuf {
            let input = dir.path().join("input.mp4");
            tokio::fs::write(&input, b"video").await.unwrap();
            input
        }

        #[tokio::test]
        async fn test_success_writes_all_outputs() {
            let dir = TempDir::new().unwrap();
            let input = input_in(&dir).await;
            let outputs = outputs_in(dir.path());

            shell_processor(WRITE_ALL, None)
                .process_video(&input, &outputs)
                .await
                .unwrap();

            for path in outputs.paths() {
                assert!(path.exists(), "{} should exist", path.display());
            }
        }

        #[tokio::test]
        async fn test_nonzero_exit_carries_stderr() {
            let dir = TempDir::new().unwrap();
            let input = input_in(&dir).await;

            let result = shell_processor("echo 'no person detected' >&2; exit 3", None)
                .process_video(&input, &outputs_in(dir.path()))
                .await;

            match result {
                Err(MediaError::ProcessorFailed {
                    message,
                    stderr,
                    exit_code,
                }) => {
                    assert_eq!(exit_code, Some(3));
                    assert!(message.contains("no person detected"));
                    assert!(stderr.unwrap().contains("no person detected"));
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_partial_outputs_fail() {
            let dir = TempDir::new().unwrap();
            let input = input_in(&dir).await;

            let result = shell_processor(r#"printf 'png' > "$4""#, None)
                .process_video(&input, &outputs_in(dir.path()))
                .await;

            assert!(matches!(result, Err(MediaError::MissingOutput(_))));
        }

        #[tokio::test]
        async fn test_missing_input() {
            let dir = TempDir::new().unwrap();
            let result = shell_processor(WRITE_ALL, None)
                .process_video(&dir.path().join("nope.mp4"), &outputs_in(dir.path()))
                .await;

            assert!(matches!(result, Err(MediaError::FileNotFound(_))));
        }

        #[tokio::test]
        async fn test_timeout_kills_process() {
            let dir = TempDir::new().unwrap();
            let input = input_in(&dir).await;

            let result = shell_processor("sleep 5", Some(Duration::from_millis(200)))
                .process_video(&input, &outputs_in(dir.path()))
                .await;

            assert!(matches!(result, Err(MediaError::Timeout(_))));
        }
    }
}
