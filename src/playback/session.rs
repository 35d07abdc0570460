use crate::controls::{Capabilities, InputAggregator, InputEvent, VoiceListener, VoiceRecognizer};
use crate::core::PlayDefinition;
use crate::playback::{PlaybackController, PlaybackSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Event delivered to a playback session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Raw input from a button, the keyboard or the speech recognizer
    Input(InputEvent),
    /// The auto-play toggle changed
    SetAutoPlay(bool),
    /// End the viewing session
    Shutdown,
}

/// Cheap handle used by the UI to talk to a running session
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
}

impl SessionHandle {
    /// Queue an event. Returns false if the session has ended.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn input(&self, event: InputEvent) -> bool {
        self.send(SessionEvent::Input(event))
    }

    pub fn set_auto_play(&self, enabled: bool) -> bool {
        self.send(SessionEvent::SetAutoPlay(enabled))
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(SessionEvent::Shutdown);
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        *self.snapshot.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

/// One viewing session of one play
///
/// All inputs and the auto-advance timer are serialized through a single
/// event loop, so the controller only ever sees one mutation at a time.
pub struct PlaybackSession {
    controller: PlaybackController,
    aggregator: InputAggregator,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Kept only until the voice listener takes it
    voice_sink: Option<mpsc::UnboundedSender<SessionEvent>>,
    voice: Option<Box<dyn VoiceRecognizer>>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackSession {
    /// Create a session for `play` and the handle that drives it
    pub fn new(play: Arc<PlayDefinition>, capabilities: Capabilities) -> (Self, SessionHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = PlaybackController::new(play);
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot {
            step_count: controller.step_count(),
            ..Default::default()
        });

        // Voice stays off until a recognizer is actually running
        let aggregator = InputAggregator::new(Capabilities {
            voice: false,
            ..capabilities
        });

        let session = Self {
            controller,
            aggregator,
            events: event_rx,
            voice_sink: Some(event_tx.clone()),
            voice: None,
            snapshot_tx,
        };
        let handle = SessionHandle {
            events: event_tx,
            snapshot: snapshot_rx,
        };
        (session, handle)
    }

    /// Listen for voice commands with `recognizer` while the session runs
    pub fn with_voice(mut self, recognizer: Box<dyn VoiceRecognizer>) -> Self {
        self.voice = Some(recognizer);
        self
    }

    /// Run the session until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!(
            "Playback session started: '{}' ({} steps)",
            self.controller.play().title,
            self.controller.step_count()
        );

        let mut listener = self.acquire_voice().await;
        self.publish(voice_running(&listener));

        loop {
            let timer = self.controller.timer().copied();
            let deadline = timer.map(|t| t.deadline).unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(SessionEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event),
                },
                _ = sleep_until(deadline), if timer.is_some() => {
                    if let Some(timer) = timer {
                        self.controller.on_auto_tick(timer.id);
                    }
                }
                _ = voice_stopped(&mut listener), if listener.is_some() => {
                    warn!("Speech recognizer stopped, voice control disabled");
                    self.aggregator.set_voice(false);
                }
                _ = self.snapshot_tx.closed() => {
                    debug!("All session handles dropped");
                    break;
                }
            }

            self.publish(voice_running(&listener));
        }

        self.controller.cancel_timer();
        if let Some(listener) = listener {
            listener.shutdown().await;
        }
        self.publish(false);

        info!("Playback session ended: '{}'", self.controller.play().title);
    }

    async fn acquire_voice(&mut self) -> Option<VoiceListener> {
        let sink = self.voice_sink.take()?;
        let Some(recognizer) = self.voice.take() else {
            debug!("No speech recognizer configured, voice control disabled");
            return None;
        };

        match VoiceListener::start(recognizer, sink, |event| SessionEvent::Input(InputEvent::Voice(event))).await {
            Ok(listener) => {
                self.aggregator.set_voice(true);
                Some(listener)
            }
            Err(e) => {
                warn!("Voice control unavailable: {}", e);
                None
            }
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Input(input) => match self.aggregator.normalize(&input) {
                Some(command) => {
                    debug!("{:?} input -> {:?}", input.source(), command);
                    self.controller.apply(command);
                }
                None => debug!("Ignoring unmapped {:?} input", input.source()),
            },
            SessionEvent::SetAutoPlay(enabled) => self.controller.set_auto_play(enabled),
            SessionEvent::Shutdown => {}
        }
    }

    fn publish(&self, voice_active: bool) {
        let snapshot = PlaybackSnapshot {
            state: self.controller.state(),
            step_count: self.controller.step_count(),
            timer_pending: self.controller.timer().is_some(),
            voice_active,
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

fn voice_running(listener: &Option<VoiceListener>) -> bool {
    listener.as_ref().is_some_and(VoiceListener::is_running)
}

/// Resolves once, when the recognizer ends on its own
async fn voice_stopped(listener: &mut Option<VoiceListener>) {
    match listener {
        Some(listener) => listener.stopped().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Key, ProcessRecognizer, RecognitionEvent, ScriptedRecognizer};
    use crate::core::{Player, Step};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::sleep;

    fn play(steps: usize, ms: u64) -> Arc<PlayDefinition> {
        let steps = (0..steps)
            .map(|i| Step {
                duration_ms: Some(ms as f64),
                players: vec![Player::new("A", 10.0 + i as f32 * 10.0, 10.0)],
                ..Default::default()
            })
            .collect();
        Arc::new(PlayDefinition::new("Session test", steps))
    }

    async fn settle() {
        sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_inputs_apply_in_order() {
        let (session, handle) = PlaybackSession::new(play(3, 500), Capabilities::default());
        let task = tokio::spawn(session.run());

        handle.input(InputEvent::Button("Next".to_string()));
        handle.input(InputEvent::Key(Key::Space));
        handle.input(InputEvent::Key(Key::ArrowLeft));
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        handle.input(InputEvent::Key(Key::Character("r".to_string())));
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 0);

        handle.shutdown();
        task.await.unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_play_advances_then_stalls() {
        let (session, handle) = PlaybackSession::new(play(3, 500), Capabilities::default());
        let task = tokio::spawn(session.run());

        handle.set_auto_play(true);
        settle().await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state.current_index, 0);
        assert!(snapshot.timer_pending);

        sleep(Duration::from_millis(510)).await;
        assert_eq!(handle.snapshot().state.current_index, 1);
        assert!(handle.snapshot().timer_pending);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.snapshot().state.current_index, 2);

        // Stalled at the last step with auto-play still on
        sleep(Duration::from_secs(5)).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state.current_index, 2);
        assert!(snapshot.state.auto_play);
        assert!(!snapshot.timer_pending);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_command_restarts_countdown() {
        let (session, handle) = PlaybackSession::new(play(4, 500), Capabilities::default());
        let task = tokio::spawn(session.run());

        handle.set_auto_play(true);
        sleep(Duration::from_millis(300)).await;
        handle.input(InputEvent::Button("Next".to_string()));
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        // The first timer would have fired at 500ms; it was cancelled
        sleep(Duration::from_millis(300)).await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        sleep(Duration::from_millis(220)).await;
        assert_eq!(handle.snapshot().state.current_index, 2);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stops_auto_play() {
        let (session, handle) = PlaybackSession::new(play(3, 500), Capabilities::default());
        let task = tokio::spawn(session.run());

        handle.set_auto_play(true);
        sleep(Duration::from_millis(600)).await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        handle.input(InputEvent::Button("Reset".to_string()));
        settle().await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state.current_index, 0);
        assert!(!snapshot.state.auto_play);
        assert!(!snapshot.timer_pending);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.snapshot().state.current_index, 0);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_commands_and_release() {
        let (recognizer, feed) = ScriptedRecognizer::new("scripted");
        let listening = recognizer.listening_flag();

        let (session, handle) = PlaybackSession::new(play(3, 500), Capabilities::default());
        let task = tokio::spawn(session.with_voice(Box::new(recognizer)).run());
        settle().await;
        assert!(handle.snapshot().voice_active);
        assert!(listening.load(Ordering::SeqCst));

        feed.send(RecognitionEvent::final_phrase("Siguiente")).unwrap();
        feed.send(RecognitionEvent::interim_phrase("next")).unwrap();
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        feed.send(RecognitionEvent::final_phrase("atrás")).unwrap();
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 0);

        handle.shutdown();
        task.await.unwrap();
        assert!(!listening.load(Ordering::SeqCst));
        assert!(!handle.snapshot().voice_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recognizer_exit_turns_voice_off() {
        let (recognizer, feed) = ScriptedRecognizer::new("scripted");

        let (session, handle) = PlaybackSession::new(play(3, 500), Capabilities::default());
        let task = tokio::spawn(session.with_voice(Box::new(recognizer)).run());
        settle().await;
        assert!(handle.snapshot().voice_active);

        drop(feed);
        settle().await;
        assert!(!handle.snapshot().voice_active);

        // Voice input is no longer translated; other sources still work
        handle.input(InputEvent::Voice(RecognitionEvent::final_phrase("next")));
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 0);
        handle.input(InputEvent::Key(Key::Space));
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_voice_is_not_an_error() {
        let recognizer = ProcessRecognizer::new("playboard-no-such-recognizer", &[]);
        let (session, handle) = PlaybackSession::new(play(2, 500), Capabilities::default());
        let task = tokio::spawn(session.with_voice(Box::new(recognizer)).run());
        settle().await;

        assert!(!handle.snapshot().voice_active);
        handle.input(InputEvent::Voice(RecognitionEvent::final_phrase("next")));
        handle.input(InputEvent::Key(Key::ArrowRight));
        settle().await;
        assert_eq!(handle.snapshot().state.current_index, 1);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_ends_session() {
        let (session, handle) = PlaybackSession::new(play(2, 500), Capabilities::default());
        let task = tokio::spawn(session.run());

        handle.set_auto_play(true);
        settle().await;
        drop(handle);

        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_play_session() {
        let (session, handle) = PlaybackSession::new(play(0, 500), Capabilities::default());
        let task = tokio::spawn(session.run());

        handle.set_auto_play(true);
        handle.input(InputEvent::Key(Key::Space));
        settle().await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.step_count, 0);
        assert_eq!(snapshot.state.current_index, 0);
        assert!(!snapshot.timer_pending);

        handle.shutdown();
        task.await.unwrap();
    }
}
