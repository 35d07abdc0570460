use crate::controls::Command;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Phrases that advance the play
pub const ADVANCE_PHRASES: &[&str] = &["next", "go", "play", "siguiente"];

/// Phrases that step back
pub const RETREAT_PHRASES: &[&str] = &["back", "previous", "atrás", "atras"];

/// Phrases that reset the play
pub const RESET_PHRASES: &[&str] = &["reset", "inicio"];

/// Errors from a speech recognizer
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Speech recognizer is not running")]
    NotStarted,

    #[error("Failed to launch speech recognizer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Speech recognizer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recognizer operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// One hypothesis list produced by the recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Alternatives, most likely first
    pub alternatives: Vec<String>,
    /// Interim results may still change and are never acted on
    pub is_final: bool,
}

/// Everything the recognizer reported in one callback
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionEvent {
    pub results: Vec<RecognitionResult>,
}

impl RecognitionEvent {
    /// Event carrying a single final transcript
    pub fn final_phrase(transcript: &str) -> Self {
        Self {
            results: vec![RecognitionResult {
                alternatives: vec![transcript.to_string()],
                is_final: true,
            }],
        }
    }

    /// Event carrying a single interim transcript
    pub fn interim_phrase(transcript: &str) -> Self {
        Self {
            results: vec![RecognitionResult {
                alternatives: vec![transcript.to_string()],
                is_final: false,
            }],
        }
    }

    /// Transcript of the last result, if that result is final
    pub fn final_transcript(&self) -> Option<&str> {
        let last = self.results.last()?;
        if !last.is_final {
            return None;
        }
        last.alternatives.first().map(String::as_str)
    }
}

/// Map a spoken phrase to a command; the whole phrase must match
pub fn phrase_command(phrase: &str) -> Option<Command> {
    let phrase = phrase.trim().to_lowercase();
    let phrase = phrase.as_str();

    if ADVANCE_PHRASES.contains(&phrase) {
        Some(Command::Advance)
    } else if RETREAT_PHRASES.contains(&phrase) {
        Some(Command::Retreat)
    } else if RESET_PHRASES.contains(&phrase) {
        Some(Command::Reset)
    } else {
        None
    }
}

/// Trait for continuous speech recognition backends
///
/// Implementations:
/// - [`ProcessRecognizer`]: an external speech-to-text program printing transcripts
/// - [`ScriptedRecognizer`]: events injected through a channel, for tests and demos
#[async_trait]
pub trait VoiceRecognizer: Send {
    /// Get the name/identifier of this recognizer
    fn name(&self) -> &str;

    /// Acquire the audio source and begin listening
    async fn start(&mut self) -> VoiceResult<()>;

    /// Wait for the next recognition event; `None` once the source is exhausted
    async fn next_event(&mut self) -> VoiceResult<Option<RecognitionEvent>>;

    /// Stop listening and release the audio source
    async fn stop(&mut self) -> VoiceResult<()>;
}

/// Recognizer backed by an external speech-to-text program.
///
/// Every stdout line is one recognition event. Lines starting with `~` are
/// interim hypotheses; all others are final transcripts.
pub struct ProcessRecognizer {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
    lines: Option<Lines<BufReader<ChildStdout>>>,
}

impl ProcessRecognizer {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            child: None,
            lines: None,
        }
    }

    /// Build from a `[program, args...]` list; `None` when the list is empty
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program, args))
    }

    fn parse_line(line: &str) -> Option<RecognitionEvent> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }
        match line.strip_prefix('~') {
            Some(interim) => Some(RecognitionEvent::interim_phrase(interim)),
            None => Some(RecognitionEvent::final_phrase(line)),
        }
    }
}

#[async_trait]
impl VoiceRecognizer for ProcessRecognizer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn start(&mut self) -> VoiceResult<()> {
        info!("Starting speech recognizer: {} {:?}", self.program, self.args);

        let mut child = ProcessCommand::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| VoiceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(VoiceError::NotStarted)?;
        self.lines = Some(BufReader::new(stdout).lines());
        self.child = Some(child);
        Ok(())
    }

    async fn next_event(&mut self) -> VoiceResult<Option<RecognitionEvent>> {
        let lines = self.lines.as_mut().ok_or(VoiceError::NotStarted)?;

        while let Some(line) = lines.next_line().await? {
            if let Some(event) = Self::parse_line(&line) {
                return Ok(Some(event));
            }
        }

        debug!("Speech recognizer {} closed its output", self.program);
        Ok(None)
    }

    async fn stop(&mut self) -> VoiceResult<()> {
        self.lines = None;
        if let Some(mut child) = self.child.take() {
            // Already exited is fine
            if let Err(e) = child.kill().await {
                debug!("Speech recognizer {} already stopped: {}", self.program, e);
            }
        }
        info!("Stopped speech recognizer: {}", self.program);
        Ok(())
    }
}

/// Recognizer fed from a channel
///
/// Events sent on the paired sender are reported in order; dropping the
/// sender ends recognition.
pub struct ScriptedRecognizer {
    name: String,
    events: mpsc::UnboundedReceiver<RecognitionEvent>,
    listening: Arc<AtomicBool>,
}

impl ScriptedRecognizer {
    /// Create a recognizer and the sender that feeds it
    pub fn new(name: &str) -> (Self, mpsc::UnboundedSender<RecognitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recognizer = Self {
            name: name.to_string(),
            events: rx,
            listening: Arc::new(AtomicBool::new(false)),
        };
        (recognizer, tx)
    }

    /// Flag that is true between `start` and `stop`
    pub fn listening_flag(&self) -> Arc<AtomicBool> {
        self.listening.clone()
    }
}

#[async_trait]
impl VoiceRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> VoiceResult<()> {
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn next_event(&mut self) -> VoiceResult<Option<RecognitionEvent>> {
        if !self.listening.load(Ordering::SeqCst) {
            return Err(VoiceError::NotStarted);
        }
        Ok(self.events.recv().await)
    }

    async fn stop(&mut self) -> VoiceResult<()> {
        self.listening.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Running recognizer forwarding events into a queue.
///
/// Holds the recognizer for as long as the listener lives. Dropping the
/// listener (or calling [`VoiceListener::shutdown`]) stops the recognizer.
pub struct VoiceListener {
    stop_tx: Option<oneshot::Sender<()>>,
    /// Resolves once the forwarding task has ended
    done_rx: Option<oneshot::Receiver<()>>,
    task: Option<JoinHandle<()>>,
}

impl VoiceListener {
    /// Start `recognizer` and forward each event, wrapped by `wrap`, into `sink`
    pub async fn start<T, F>(
        mut recognizer: Box<dyn VoiceRecognizer>,
        sink: mpsc::UnboundedSender<T>,
        wrap: F,
    ) -> VoiceResult<Self>
    where
        T: Send + 'static,
        F: Fn(RecognitionEvent) -> T + Send + 'static,
    {
        recognizer.start().await?;

        let name = recognizer.name().to_string();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        let task_name = name.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = recognizer.next_event() => match event {
                        Ok(Some(event)) => {
                            if sink.send(wrap(event)).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("Speech recognizer {} finished", task_name);
                            break;
                        }
                        Err(e) => {
                            warn!("Speech recognizer {} failed: {}", task_name, e);
                            break;
                        }
                    },
                }
            }

            if let Err(e) = recognizer.stop().await {
                warn!("Failed to stop speech recognizer {}: {}", task_name, e);
            }
            let _ = done_tx.send(());
        });

        info!("Voice control enabled ({})", name);
        Ok(Self {
            stop_tx: Some(stop_tx),
            done_rx: Some(done_rx),
            task: Some(task),
        })
    }

    /// Whether the recognizer is still delivering events
    pub fn is_running(&self) -> bool {
        self.done_rx.is_some() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait until the recognizer stops on its own; pending forever once it has
    pub async fn stopped(&mut self) {
        match self.done_rx.as_mut() {
            Some(done) => {
                let _ = done.await;
                self.done_rx = None;
            }
            None => std::future::pending().await,
        }
    }

    /// Stop the recognizer and wait until it has released its source
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for VoiceListener {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_mapping() {
        assert_eq!(phrase_command("next"), Some(Command::Advance));
        assert_eq!(phrase_command("  Siguiente "), Some(Command::Advance));
        assert_eq!(phrase_command("GO"), Some(Command::Advance));
        assert_eq!(phrase_command("Atrás"), Some(Command::Retreat));
        assert_eq!(phrase_command("previous"), Some(Command::Retreat));
        assert_eq!(phrase_command("Inicio"), Some(Command::Reset));
        assert_eq!(phrase_command("next please"), None);
        assert_eq!(phrase_command(""), None);
    }

    #[test]
    fn test_final_transcript_uses_last_result() {
        let event = RecognitionEvent {
            results: vec![
                RecognitionResult {
                    alternatives: vec!["back".to_string()],
                    is_final: true,
                },
                RecognitionResult {
                    alternatives: vec!["next".to_string(), "text".to_string()],
                    is_final: true,
                },
            ],
        };
        assert_eq!(event.final_transcript(), Some("next"));

        assert_eq!(RecognitionEvent::interim_phrase("next").final_transcript(), None);
        assert_eq!(RecognitionEvent::default().final_transcript(), None);
    }

    #[test]
    fn test_process_line_protocol() {
        assert_eq!(
            ProcessRecognizer::parse_line("next\r"),
            Some(RecognitionEvent::final_phrase("next"))
        );
        assert_eq!(
            ProcessRecognizer::parse_line("~nex"),
            Some(RecognitionEvent::interim_phrase("nex"))
        );
        assert_eq!(ProcessRecognizer::parse_line("   "), None);
        assert!(ProcessRecognizer::from_command_line(&[]).is_none());
    }

    #[tokio::test]
    async fn test_listener_forwards_and_releases() {
        let (recognizer, feed) = ScriptedRecognizer::new("scripted");
        let listening = recognizer.listening_flag();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let listener = VoiceListener::start(Box::new(recognizer), tx, |event| event)
            .await
            .unwrap();
        assert!(listening.load(Ordering::SeqCst));

        feed.send(RecognitionEvent::final_phrase("next")).unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.final_transcript(), Some("next"));

        listener.shutdown().await;
        assert!(!listening.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_listener_stops_when_dropped() {
        let (recognizer, _feed) = ScriptedRecognizer::new("scripted");
        let listening = recognizer.listening_flag();
        let (tx, _rx) = mpsc::unbounded_channel::<RecognitionEvent>();

        let listener = VoiceListener::start(Box::new(recognizer), tx, |event| event)
            .await
            .unwrap();
        drop(listener);

        for _ in 0..100 {
            if !listening.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(!listening.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_listener_reports_recognizer_exit() {
        let (recognizer, feed) = ScriptedRecognizer::new("scripted");
        let listening = recognizer.listening_flag();
        let (tx, _rx) = mpsc::unbounded_channel::<RecognitionEvent>();

        let mut listener = VoiceListener::start(Box::new(recognizer), tx, |event| event)
            .await
            .unwrap();
        assert!(listener.is_running());

        drop(feed);
        listener.stopped().await;
        assert!(!listener.is_running());
        assert!(!listening.load(Ordering::SeqCst));

        listener.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let mut recognizer = ProcessRecognizer::new("playboard-no-such-recognizer", &[]);
        let err = recognizer.start().await.unwrap_err();
        assert!(matches!(err, VoiceError::Spawn { .. }));
    }
}
