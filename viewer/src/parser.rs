use crate::buffer::DemoBuffer;
use crate::worker::{self, WorkerMessage};
use analysis::timeline::Config;
use analysis::{BuildError, CachedDemo};
use common::demo_analysis::CachedDeath;
use common::entities::{CachedBuilding, CachedPlayer, CachedProjectile};
use common::Tick;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("demo could not be loaded: {0}")]
    Build(#[from] BuildError),
    #[error("the demo is already being or has been parsed")]
    AlreadyStarted,
    #[error("the demo has not been cached")]
    NotCached,
    #[error("background parse stopped without a result")]
    WorkerGone,
}

pub type ProgressCallback = Box<dyn FnMut(f32) + Send>;

/// Shared access to the progress callback of an [`AsyncParser`]. Unlike the parser
/// itself it can be used while [`AsyncParser::cache`] is running.
#[derive(Clone)]
pub struct ProgressHandle(Arc<Mutex<Option<ProgressCallback>>>);

impl ProgressHandle {
    fn new(callback: ProgressCallback) -> Self {
        Self(Arc::new(Mutex::new(Some(callback))))
    }

    /// Stops forwarding progress, the parse itself keeps going.
    pub fn detach(&self) {
        *self.lock() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.lock().is_some()
    }

    fn report(&self, fraction: f32) {
        if let Some(progress) = self.lock().as_mut() {
            progress(fraction);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressCallback>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for ProgressHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ProgressHandle")
            .field(&self.is_attached())
            .finish()
    }
}

#[derive(Debug)]
enum State {
    Idle(DemoBuffer),
    Running,
    Ready(CachedDemo),
    Failed,
    // the cache future was dropped before the parse finished
    Cancelled,
}

// Marks the parse as cancelled if the cache future is dropped while it is running.
struct RunningGuard<'p>(&'p mut State);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if matches!(self.0, State::Running) {
            tracing::debug!("Parse cancelled");
            *self.0 = State::Cancelled;
        }
    }
}

/// Parses a demo in the background and answers tick queries once it is done.
///
/// Dropping the future returned by [`cache`](Self::cache) cancels the parse. The
/// parser stays unusable afterwards: queries fail with [`ParseError::NotCached`] and
/// `cache` with [`ParseError::AlreadyStarted`].
pub struct AsyncParser {
    state: State,
    config: Config,
    progress: ProgressHandle,
}

impl AsyncParser {
    pub fn new<B, F>(buffer: B, progress: F) -> Self
    where
        B: Into<DemoBuffer>,
        F: FnMut(f32) + Send + 'static,
    {
        Self {
            state: State::Idle(buffer.into()),
            config: Config::default(),
            progress: ProgressHandle::new(Box::new(progress)),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Stops forwarding progress, the parse itself keeps going.
    pub fn detach_progress(&self) {
        self.progress.detach();
    }

    /// A handle to detach the progress callback while [`cache`](Self::cache) runs.
    pub fn progress_handle(&self) -> ProgressHandle {
        self.progress.clone()
    }

    /// Parses the demo. Can only be called once per parser, progress is reported
    /// through the callback while it runs.
    #[tracing::instrument(skip(self))]
    pub async fn cache(&mut self) -> Result<(), ParseError> {
        let buffer = match std::mem::replace(&mut self.state, State::Running) {
            State::Idle(buffer) => buffer,
            other => {
                self.state = other;
                return Err(ParseError::AlreadyStarted);
            }
        };

        tracing::info!(bytes = buffer.len(), "Parsing demo");
        let mut rx = worker::spawn(buffer, self.config.clone());
        let progress = self.progress.clone();
        let state = RunningGuard(&mut self.state);

        while let Some(message) = rx.recv().await {
            match message {
                WorkerMessage::Progress(fraction) => progress.report(fraction),
                WorkerMessage::Failed(e) => {
                    *state.0 = State::Failed;
                    return Err(e.into());
                }
                WorkerMessage::Done(data) => {
                    let demo = CachedDemo::rehydrate(*data);
                    tracing::info!(
                        map = %demo.header().map,
                        ticks = demo.ticks(),
                        players = demo.next_mapped_player(),
                        "Cached demo"
                    );
                    *state.0 = State::Ready(demo);
                    return Ok(());
                }
            }
        }

        *state.0 = State::Failed;
        Err(ParseError::WorkerGone)
    }

    /// Whether a `cache` future was dropped before its parse finished.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, State::Cancelled)
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    pub fn demo(&self) -> Result<&CachedDemo, ParseError> {
        match &self.state {
            State::Ready(demo) => Ok(demo),
            _ => Err(ParseError::NotCached),
        }
    }

    pub fn into_demo(self) -> Result<CachedDemo, ParseError> {
        match self.state {
            State::Ready(demo) => Ok(demo),
            _ => Err(ParseError::NotCached),
        }
    }

    pub fn get_players_at_tick(&self, tick: Tick) -> Result<Vec<CachedPlayer>, ParseError> {
        Ok(self.demo()?.players_at_tick(tick))
    }

    pub fn get_building_at_tick(&self, tick: Tick) -> Result<Vec<CachedBuilding>, ParseError> {
        Ok(self.demo()?.buildings_at_tick(tick))
    }

    pub fn get_projectiles_at_tick(&self, tick: Tick) -> Result<Vec<CachedProjectile>, ParseError> {
        Ok(self.demo()?.projectiles_at_tick(tick))
    }

    pub fn get_deaths_at_tick(&self, tick: Tick) -> Result<&[CachedDeath], ParseError> {
        Ok(self.demo()?.deaths_at_tick(tick))
    }
}

impl core::fmt::Debug for AsyncParser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncParser")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("progress", &self.progress)
            .finish()
    }
}
