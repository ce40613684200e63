//! Playback session controller.
//!
//! Owns the single live engine handle for the media sink and drives the
//! session state machine:
//!
//! `Idle -> Connecting -> Playing <-> Stalled -> (Connecting | Fatal)`
//!
//! Channel selections are debounced so a rapid switch sequence produces
//! exactly one attach, targeting the final channel. A tune that has begun
//! always runs to completion; a superseding selection reclaims its engine
//! through the ordinary teardown at the start of its own tune. Teardown
//! (channel change or shutdown) always performs the same routine: destroy
//! the engine, pause and detach the sink, fire the remote cleanup
//! notification.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::engine::{
    EngineErrorKind, EngineEvent, EngineFactory, EngineSettings, MediaSink, SinkError,
    StreamEngine, StreamGateway,
};
use crate::config::PlaybackConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Connecting,
    Playing,
    Stalled,
    /// Terminal for the session; requires an explicit re-selection to
    /// recover. Carries the user-visible error message.
    Fatal(String),
}

/// One active attachment between the media sink and a remote stream.
struct Session {
    channel_number: u32,
    engine: Option<Box<dyn StreamEngine>>,
    event_task: Option<JoinHandle<()>>,
}

pub struct PlaybackController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    debounce: Duration,
    settings: EngineSettings,
    factory: Arc<dyn EngineFactory>,
    sink: Arc<dyn MediaSink>,
    gateway: Arc<dyn StreamGateway>,
    session: Mutex<Option<Session>>,
    /// Serializes tune and shutdown. An in-flight tune holds this for its
    /// whole duration, so whatever it stores is reclaimed by the next
    /// holder's teardown instead of being dropped mid-attach.
    tune_lock: Mutex<()>,
    /// Bumped on every selection and shutdown; a debounced tune proceeds
    /// only while its generation is still the current one.
    generation: AtomicU64,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl PlaybackController {
    pub fn new(
        config: &PlaybackConfig,
        factory: Arc<dyn EngineFactory>,
        sink: Arc<dyn MediaSink>,
        gateway: Arc<dyn StreamGateway>,
    ) -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::Idle);
        Self {
            inner: Arc::new(ControllerInner {
                debounce: config.switch_debounce(),
                settings: config.engine_settings(),
                factory,
                sink,
                gateway,
                session: Mutex::new(None),
                tune_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
                status_tx,
            }),
        }
    }

    /// Subscribe to status changes.
    pub fn status(&self) -> watch::Receiver<PlaybackStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn current_status(&self) -> PlaybackStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Select a channel. The tune runs after the debounce delay; selecting
    /// again within the window supersedes the pending tune, so only the
    /// last selection attaches. Must be called within a Tokio runtime.
    pub fn select_channel(&self, channel_number: u32) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Channel {} selected, debouncing switch", channel_number);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.tune(generation, channel_number).await;
        });
    }

    /// Tear the session down (unmount). Invalidates any pending switch,
    /// waits for an in-flight tune to finish, destroys the engine,
    /// detaches the sink, and fires the remote cleanup notification for
    /// the current channel.
    pub async fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let _tuning = self.inner.tune_lock.lock().await;
        self.inner.teardown().await;
        self.inner.set_status(PlaybackStatus::Idle);
    }
}

impl ControllerInner {
    fn set_status(&self, status: PlaybackStatus) {
        self.status_tx.send_replace(status);
    }

    /// Teardown-then-reattach sequence for one channel. Runs to completion
    /// once started; a stale generation returns before touching anything.
    async fn tune(self: &Arc<Self>, generation: u64, channel_number: u32) {
        let _tuning = self.tune_lock.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Switch to channel {} superseded, skipping", channel_number);
            return;
        }

        self.teardown().await;
        self.set_status(PlaybackStatus::Connecting);

        // Clear any stale server-side process for this endpoint before
        // attaching; best-effort like every cleanup call.
        self.gateway.notify_cleanup(channel_number).await;

        let source_url = self.gateway.stream_url(channel_number);
        info!("Attaching stream engine for channel {} at {}", channel_number, source_url);

        let (engine, events) = match self.factory.create(&source_url, &self.settings).await {
            Ok(created) => created,
            Err(err) => {
                error!("Failed to create stream engine for channel {}: {}", channel_number, err);
                self.set_status(PlaybackStatus::Fatal(err.detail));
                return;
            }
        };

        let event_task = tokio::spawn({
            let inner = Arc::clone(self);
            async move { inner.run_events(events).await }
        });

        let mut session = self.session.lock().await;
        *session = Some(Session {
            channel_number,
            engine: Some(engine),
            event_task: Some(event_task),
        });
    }

    async fn run_events(self: Arc<Self>, mut events: mpsc::Receiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }
    }

    /// Apply one engine event. Returns `false` once the session is over
    /// and no further events should be consumed.
    async fn handle_event(&self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::ManifestParsed => {
                match self.sink.play().await {
                    Ok(()) => self.set_status(PlaybackStatus::Playing),
                    Err(SinkError::AutoplayBlocked) => {
                        // Expected policy restriction: stay attached and
                        // wait for a user gesture, no error surfaced.
                        warn!("Autoplay rejected by sink; staying in {:?}", self.status_tx.borrow().clone());
                    }
                    Err(err) => {
                        warn!("Sink rejected playback after manifest parse: {}", err);
                    }
                }
                true
            }
            EngineEvent::FragmentBuffered => {
                if *self.status_tx.borrow() == PlaybackStatus::Stalled {
                    self.set_status(PlaybackStatus::Playing);
                }
                true
            }
            EngineEvent::BufferStalled => {
                debug!("Buffer stalled, restarting load");
                self.set_status(PlaybackStatus::Stalled);
                {
                    let mut session = self.session.lock().await;
                    if let Some(engine) = session.as_mut().and_then(|s| s.engine.as_mut()) {
                        engine.stop_load();
                        engine.start_load();
                    }
                }
                if let Err(err) = self.sink.play().await {
                    warn!("Re-issued play after stall was rejected: {}", err);
                }
                true
            }
            EngineEvent::Error(err) if !err.fatal => {
                let mut session = self.session.lock().await;
                if let Some(engine) = session.as_mut().and_then(|s| s.engine.as_mut()) {
                    match err.kind {
                        EngineErrorKind::Network => {
                            warn!("Recoverable network error, reloading: {}", err.detail);
                            engine.start_load();
                        }
                        EngineErrorKind::Media => {
                            warn!("Recoverable media error, recovering: {}", err.detail);
                            engine.recover_media_error();
                        }
                        EngineErrorKind::Other => {
                            warn!("Recoverable stream error: {}", err.detail);
                        }
                    }
                }
                self.set_status(PlaybackStatus::Connecting);
                true
            }
            EngineEvent::Error(err) => {
                error!("Fatal stream error: {}", err.detail);
                {
                    let mut session = self.session.lock().await;
                    // Destroy the handle but keep the session entry so a
                    // later teardown still cleans up the endpoint.
                    if let Some(mut engine) = session.as_mut().and_then(|s| s.engine.take()) {
                        engine.destroy();
                    }
                }
                self.set_status(PlaybackStatus::Fatal(err.detail));
                false
            }
        }
    }

    /// Idempotent teardown: destroy the engine if present, pause and
    /// detach the sink, fire the remote cleanup notification. All three
    /// happen together on every exit path.
    async fn teardown(&self) {
        let taken = self.session.lock().await.take();
        if let Some(mut session) = taken {
            if let Some(mut engine) = session.engine.take() {
                engine.destroy();
            }
            if let Some(task) = session.event_task.take() {
                task.abort();
            }
            self.sink.pause();
            self.sink.detach();
            self.gateway.notify_cleanup(session.channel_number).await;
            info!("Playback session for channel {} torn down", session.channel_number);
        }
    }
}
