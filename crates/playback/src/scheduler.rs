//! Live preview scheduler.
//!
//! One cooperative tokio task walks the reel frame by frame through
//! `entering -> holding -> exiting`, looping over the N text slides and
//! the trailing logo slide forever. The task is driven from outside by
//! [`Command`]s and reports every phase change as a [`PlaybackEvent`].
//!
//! Everything the current slide is waiting on (its phase deadline, an
//! in-flight synthesis request, a playing clip) lives in one
//! [`SlideTasks`] value. Transitions replace that value wholesale, so the
//! previous slide's work is cancelled by drop before the next slide's
//! work can run.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use reelforge_core::error::UpstreamError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PlaybackConfig;
use crate::policy::{next_index, HoldPolicy, Phase, PreviewScript};
use crate::speech::{AudioSink, SpeechClip, SpeechPlayback, SpeechSynthesizer};

const COMMAND_CHANNEL_CAPACITY: usize = 16;
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// External control of a running preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Snap to `holding` at the index and suspend automatic transitions.
    ForceIndex(usize),
    /// Lift a forced index and re-enter the current slide.
    ClearOverride,
    /// Enter the given index from `entering` (progress-dot click).
    JumpTo(usize),
    /// Re-enter the current slide from `entering`.
    Reset,
}

/// Emitted on every phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub index: usize,
    pub phase: Phase,
    /// True while a forced index is in effect.
    pub forced: bool,
    pub at: Instant,
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Preview scheduler has stopped")]
    Stopped,
}

/// Speech collaborators used for narrated holds.
#[derive(Clone)]
pub struct SpeechEngine {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn AudioSink>,
}

// ---------------------------------------------------------------------------
// Slide task set
// ---------------------------------------------------------------------------

type SynthesisFuture = BoxFuture<'static, Result<SpeechClip, UpstreamError>>;

/// Everything the current slide owns. At most one synthesis request and
/// one playing clip exist at any time.
struct SlideTasks {
    deadline: Option<Instant>,
    synthesis: Option<SynthesisFuture>,
    playback: Option<Box<dyn SpeechPlayback>>,
}

impl SlideTasks {
    fn idle() -> Self {
        Self {
            deadline: None,
            synthesis: None,
            playback: None,
        }
    }

    fn timer(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            synthesis: None,
            playback: None,
        }
    }
}

impl Drop for SlideTasks {
    fn drop(&mut self) {
        if let Some(playback) = self.playback.as_mut() {
            playback.stop();
        }
    }
}

enum Wake {
    Cancelled,
    Command(Option<Command>),
    Synthesized(Result<SpeechClip, UpstreamError>),
    PlaybackEnded,
    Deadline,
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn wait_synthesis(
    synthesis: &mut Option<SynthesisFuture>,
) -> Result<SpeechClip, UpstreamError> {
    match synthesis {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn wait_playback(playback: &mut Option<Box<dyn SpeechPlayback>>) {
    match playback {
        Some(playback) => playback.ended().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct PreviewScheduler {
    script: PreviewScript,
    config: PlaybackConfig,
    speech: Option<SpeechEngine>,
    index: usize,
    phase: Phase,
    forced: Option<usize>,
    tasks: SlideTasks,
}

/// Owner-side handle. Dropping it tears the scheduler down.
pub struct PreviewHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

struct Running {
    scheduler: PreviewScheduler,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
}

impl PreviewScheduler {
    pub fn new(script: PreviewScript, config: PlaybackConfig) -> Self {
        Self {
            script,
            config,
            speech: None,
            index: 0,
            phase: Phase::Entering,
            forced: None,
            tasks: SlideTasks::idle(),
        }
    }

    /// Enable narrated holds. Slides still use fixed timing unless the
    /// script carries a voice.
    pub fn with_speech(mut self, engine: SpeechEngine) -> Self {
        self.speech = Some(engine);
        self
    }

    /// Start the scheduler task at `entering`, index 0.
    ///
    /// The returned receiver is subscribed before the task starts, so it
    /// observes the very first event.
    pub fn spawn(self) -> (PreviewHandle, broadcast::Receiver<PlaybackEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let running = Running {
            scheduler: self,
            commands: command_rx,
            events: event_tx.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(running.run());

        let handle = PreviewHandle {
            commands: command_tx,
            events: event_tx,
            cancel,
            task: Some(task),
        };
        (handle, event_rx)
    }

    fn narration(&self, index: usize) -> Option<SynthesisFuture> {
        let engine = self.speech.as_ref()?;
        let text = self.script.speech_text(index)?.to_string();
        let voice_id = self.script.voice_id.clone()?;
        let synthesizer = Arc::clone(&engine.synthesizer);
        Some(async move { synthesizer.synthesize(&text, &voice_id).await }.boxed())
    }

    fn hold_policy(&self) -> HoldPolicy {
        if self.speech.is_some() {
            self.script.hold_policy(self.index, &self.config)
        } else {
            HoldPolicy::Fixed(self.config.fixed_hold)
        }
    }

    fn is_valid_index(&self, index: usize) -> bool {
        index < self.script.frame_count()
    }
}

impl Running {
    async fn run(mut self) {
        tracing::debug!(
            frames = self.scheduler.script.frame_count(),
            narrated = self.scheduler.speech.is_some(),
            "Preview scheduler started",
        );
        self.enter(0);

        loop {
            let tasks = &mut self.scheduler.tasks;
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                command = self.commands.recv() => Wake::Command(command),
                result = wait_synthesis(&mut tasks.synthesis) => Wake::Synthesized(result),
                _ = wait_playback(&mut tasks.playback) => Wake::PlaybackEnded,
                _ = wait_deadline(tasks.deadline) => Wake::Deadline,
            };

            match wake {
                Wake::Cancelled | Wake::Command(None) => break,
                Wake::Command(Some(command)) => self.apply(command),
                Wake::Synthesized(result) => self.on_synthesized(result),
                Wake::PlaybackEnded => self.on_playback_ended(),
                Wake::Deadline => self.on_deadline(),
            }
        }

        // Stops any playing clip and drops the in-flight request.
        self.scheduler.tasks = SlideTasks::idle();
        tracing::debug!(index = self.scheduler.index, "Preview scheduler stopped");
    }

    // ---- transitions ----

    fn enter(&mut self, index: usize) {
        let s = &mut self.scheduler;
        s.index = index;
        s.phase = Phase::Entering;
        s.tasks = SlideTasks::timer(Instant::now() + s.config.entering);
        self.emit();
    }

    fn hold(&mut self) {
        let s = &mut self.scheduler;
        let now = Instant::now();
        s.phase = Phase::Holding;
        s.tasks = match s.hold_policy() {
            HoldPolicy::Fixed(duration) => SlideTasks::timer(now + duration),
            HoldPolicy::SpeechSynced { ceiling } => SlideTasks {
                deadline: Some(now + ceiling),
                synthesis: s.narration(s.index),
                playback: None,
            },
        };
        self.emit();
    }

    fn exit(&mut self) {
        let s = &mut self.scheduler;
        s.phase = Phase::Exiting;
        s.tasks = SlideTasks::timer(Instant::now() + s.config.exiting);
        self.emit();
    }

    fn force(&mut self, index: usize) {
        let s = &mut self.scheduler;
        if s.forced == Some(index) {
            return;
        }
        s.forced = Some(index);
        s.index = index;
        s.phase = Phase::Holding;
        s.tasks = SlideTasks {
            deadline: None,
            synthesis: s.narration(index),
            playback: None,
        };
        self.emit();
    }

    // ---- wake handlers ----

    fn apply(&mut self, command: Command) {
        tracing::debug!(?command, index = self.scheduler.index, "Preview command");
        match command {
            Command::ForceIndex(index) | Command::JumpTo(index)
                if !self.scheduler.is_valid_index(index) =>
            {
                tracing::warn!(
                    index,
                    frames = self.scheduler.script.frame_count(),
                    "Ignoring out-of-range preview index",
                );
            }
            Command::ForceIndex(index) => self.force(index),
            Command::ClearOverride => {
                if self.scheduler.forced.take().is_some() {
                    self.enter(self.scheduler.index);
                }
            }
            Command::JumpTo(index) => {
                self.scheduler.forced = None;
                self.enter(index);
            }
            Command::Reset => {
                self.scheduler.forced = None;
                self.enter(self.scheduler.index);
            }
        }
    }

    fn on_deadline(&mut self) {
        match self.scheduler.phase {
            Phase::Entering => self.hold(),
            Phase::Holding => self.exit(),
            Phase::Exiting => {
                let next = next_index(self.scheduler.index, self.scheduler.script.frame_count());
                self.enter(next);
            }
        }
    }

    fn on_synthesized(&mut self, result: Result<SpeechClip, UpstreamError>) {
        let s = &mut self.scheduler;
        s.tasks.synthesis = None;
        let started = result.and_then(|clip| match &s.speech {
            Some(engine) => engine.sink.start(clip),
            None => Err(UpstreamError::Unreachable {
                service: "audio sink",
                message: "no audio sink configured".into(),
            }),
        });
        match started {
            Ok(playback) => s.tasks.playback = Some(playback),
            Err(e) => {
                tracing::warn!(
                    index = s.index,
                    error = %e,
                    "Narration unavailable, holding until ceiling",
                );
            }
        }
    }

    fn on_playback_ended(&mut self) {
        let s = &mut self.scheduler;
        s.tasks.playback = None;
        if s.forced.is_none() && s.phase == Phase::Holding {
            self.exit();
        }
    }

    fn emit(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let s = &self.scheduler;
        // No subscribers is not an error.
        let _ = self.events.send(PlaybackEvent {
            index: s.index,
            phase: s.phase,
            forced: s.forced.is_some(),
            at: Instant::now(),
        });
    }
}

impl PreviewHandle {
    pub async fn send(&self, command: Command) -> Result<(), PlaybackError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::Stopped)
    }

    pub async fn force_index(&self, index: usize) -> Result<(), PlaybackError> {
        self.send(Command::ForceIndex(index)).await
    }

    pub async fn clear_override(&self) -> Result<(), PlaybackError> {
        self.send(Command::ClearOverride).await
    }

    pub async fn jump_to(&self, index: usize) -> Result<(), PlaybackError> {
        self.send(Command::JumpTo(index)).await
    }

    pub async fn reset(&self) -> Result<(), PlaybackError> {
        self.send(Command::Reset).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Cancel the scheduler and wait for its task to finish. No event is
    /// emitted after this returns.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Preview scheduler task failed");
            }
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
