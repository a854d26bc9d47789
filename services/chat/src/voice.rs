//! Optional speech capture
//!
//! A transcript only ever fills the caller's draft. Nothing here submits.

use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::VoiceError;

/// Shown when no recognizer is configured
pub const UNSUPPORTED_NOTICE: &str = "Speech recognition is not supported in this environment.";

/// Something that listens once and returns what it heard
pub trait SpeechRecognizer: Send + Sync {
    fn listen(&self) -> impl Future<Output = Result<String, VoiceError>> + Send;
}

/// Recognizer that runs an external command and reads its stdout
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Split a whitespace-separated command line; `None` if it is blank
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl SpeechRecognizer for CommandRecognizer {
    async fn listen(&self) -> Result<String, VoiceError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(VoiceError::Recognizer(output.status));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(VoiceError::NoSpeech);
        }
        Ok(transcript)
    }
}

/// Result of one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    Transcript(String),
    Unsupported(String),
    AlreadyListening,
    Failed(String),
}

struct Listening<'a>(&'a AtomicBool);

impl Drop for Listening<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Voice input with at most one capture at a time
pub struct VoiceInput<R> {
    recognizer: Option<R>,
    listening: AtomicBool,
}

impl<R: SpeechRecognizer> VoiceInput<R> {
    pub fn new(recognizer: Option<R>) -> Self {
        Self {
            recognizer,
            listening: AtomicBool::new(false),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    pub async fn capture(&self) -> VoiceOutcome {
        let Some(recognizer) = &self.recognizer else {
            return VoiceOutcome::Unsupported(UNSUPPORTED_NOTICE.to_string());
        };
        if self.listening.swap(true, Ordering::AcqRel) {
            return VoiceOutcome::AlreadyListening;
        }
        let _listening = Listening(&self.listening);

        info!("Listening for speech");
        match recognizer.listen().await {
            Ok(transcript) => VoiceOutcome::Transcript(transcript),
            Err(e) => {
                warn!("Speech capture failed: {}", e);
                VoiceOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, assert_ready, task};

    struct Gated {
        release: Arc<Notify>,
    }

    impl SpeechRecognizer for Gated {
        async fn listen(&self) -> Result<String, VoiceError> {
            self.release.notified().await;
            Ok("what are the office hours".to_string())
        }
    }

    #[tokio::test]
    async fn test_missing_recognizer_degrades_to_notice() {
        let voice: VoiceInput<CommandRecognizer> = VoiceInput::new(None);
        assert!(!voice.is_supported());
        assert_eq!(
            voice.capture().await,
            VoiceOutcome::Unsupported(UNSUPPORTED_NOTICE.to_string())
        );
    }

    #[test]
    fn test_overlapping_capture_is_refused() {
        let release = Arc::new(Notify::new());
        let voice = VoiceInput::new(Some(Gated {
            release: release.clone(),
        }));

        let mut first = task::spawn(voice.capture());
        assert_pending!(first.poll());
        assert!(voice.is_listening());

        let mut second = task::spawn(voice.capture());
        assert_eq!(
            assert_ready!(second.poll()),
            VoiceOutcome::AlreadyListening
        );

        release.notify_one();
        assert_eq!(
            assert_ready!(first.poll()),
            VoiceOutcome::Transcript("what are the office hours".to_string())
        );
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_command_line_parsing() {
        assert!(CommandRecognizer::from_command_line("   ").is_none());
        let recognizer = CommandRecognizer::from_command_line("whisper --lang en").unwrap();
        assert_eq!(recognizer.program, "whisper");
        assert_eq!(recognizer.args, vec!["--lang", "en"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_reads_stdout() {
        let voice = VoiceInput::new(CommandRecognizer::from_command_line("echo degree requirements"));
        assert_eq!(
            voice.capture().await,
            VoiceOutcome::Transcript("degree requirements".to_string())
        );

        let silent = VoiceInput::new(CommandRecognizer::from_command_line("true"));
        assert_eq!(
            silent.capture().await,
            VoiceOutcome::Failed("No speech was recognized".to_string())
        );
    }
}
