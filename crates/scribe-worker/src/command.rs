//! Transcription via an external engine process.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use scribe_entity::{Transcript, TranscriptionParams};

use crate::transcriber::{TranscribeError, Transcriber};

/// Runs a speech-to-text engine as a child process.
///
/// Contract with the engine binary: parameters as long flags, the audio
/// path as the final argument, a JSON transcript on stdout, diagnostics
/// on stderr, non-zero exit on failure.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    command: String,
}

impl CommandTranscriber {
    /// Create a transcriber driving the given engine binary.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn build_command(&self, audio_path: &Path, params: &TranscriptionParams) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--task").arg(params.task.to_string());
        cmd.arg("--beam-size").arg(params.beam_size.to_string());
        if let Some(language) = &params.language {
            cmd.arg("--language").arg(language);
        }
        if params.vad_filter {
            cmd.arg("--vad-filter");
        }
        if params.word_timestamps {
            cmd.arg("--word-timestamps");
        }
        if params.enable_diarization {
            cmd.arg("--diarize");
            if let Some(min) = params.min_speakers {
                cmd.arg("--min-speakers").arg(min.to_string());
            }
            if let Some(max) = params.max_speakers {
                cmd.arg("--max-speakers").arg(max.to_string());
            }
        }
        cmd.arg(audio_path);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        params: &TranscriptionParams,
    ) -> Result<Transcript, TranscribeError> {
        debug!(engine = %self.command, path = %audio_path.display(), "Invoking engine");

        let output = self
            .build_command(audio_path, params)
            .output()
            .await
            .map_err(|e| {
                TranscribeError::new(format!("Failed to launch engine '{}': {e}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::new(format!(
                "Engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscribeError::new(format!("Engine produced invalid transcript: {e}")))
    }
}
