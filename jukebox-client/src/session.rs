//! Playback session
//!
//! [`Session`] owns everything the client knows at runtime: the asset
//! registry, the pending queue, the dispatcher, the current track, the
//! transcript and the playback backend. All of it is mutated from one task
//! through [`Session::run`], which alternates between handling
//! [`SessionEvent`]s and the periodic drain step.
//!
//! **Non-overlap:** at most one track is current at any time. The current
//! track is set when its play request is issued and cleared only by a
//! completion event carrying the same [`PlaybackId`].

use std::time::Duration;

use jukebox_common::Token;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::dispatcher::{OutboundSender, StreamDispatcher};
use crate::error::Error;
use crate::events::{EventReceiver, PlaybackId, SessionEvent};
use crate::playback::{
    AssetRegistry, AssetState, Lookup, PlaybackBackend, PlaybackQueue, RegistryStatus,
};
use crate::transcript::Transcript;

/// Session parameters fixed at startup
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base for resolving relative manifest URLs
    pub base_url: Url,
    pub drain_interval: Duration,
    pub preload: bool,
}

/// Track whose play request is outstanding or playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTrack {
    pub token: Token,
    pub playback: PlaybackId,
}

/// Whether the loop should keep going after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Finished,
}

/// What one drain step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drain {
    /// Queue empty
    Idle,
    /// A track is current
    Busy,
    /// Head token waits for the manifest
    Deferred,
    Started(PlaybackId),
    /// Head token had no asset
    Dropped(Token),
    /// Backend refused to start the head token
    Failed(Token),
}

/// Counters reported when the session ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Tracks that played to the end
    pub played: usize,
    pub dropped: usize,
    pub failed: usize,
    pub discarded: usize,
}

pub struct Session<B: PlaybackBackend> {
    config: SessionConfig,
    registry: AssetRegistry,
    queue: PlaybackQueue,
    dispatcher: StreamDispatcher,
    current: Option<CurrentTrack>,
    transcript: Transcript,
    backend: B,
    next_playback: u64,
    summary: SessionSummary,
}

impl<B: PlaybackBackend> Session<B> {
    pub fn new(
        config: SessionConfig,
        backend: B,
        outbound: Option<OutboundSender>,
        transcript: Transcript,
    ) -> Self {
        Self {
            config,
            registry: AssetRegistry::new(),
            queue: PlaybackQueue::new(),
            dispatcher: StreamDispatcher::new(outbound),
            current: None,
            transcript,
            backend,
            next_playback: 0,
            summary: SessionSummary::default(),
        }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn dispatcher(&self) -> &StreamDispatcher {
        &self.dispatcher
    }

    pub fn current(&self) -> Option<&CurrentTrack> {
        self.current.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Connection closed and nothing left playing
    pub fn is_finished(&self) -> bool {
        self.dispatcher.is_closed() && self.current.is_none()
    }

    /// Handle one event to completion
    pub fn handle_event(&mut self, event: SessionEvent) -> SessionControl {
        match event {
            SessionEvent::ManifestLoaded(manifest) => {
                if self.registry.status() != RegistryStatus::Pending {
                    warn!("Ignoring manifest: registry already {:?}", self.registry.status());
                } else {
                    self.registry
                        .populate(&manifest, &self.config.base_url, self.config.preload);
                    for asset in self.registry.preloadable() {
                        self.backend.preload(asset);
                    }
                    let tokens: Vec<&str> =
                        self.registry.tokens().into_iter().map(Token::as_str).collect();
                    self.transcript
                        .notice(format!("sounds available: {}", tokens.join(", ")));
                }
            }
            SessionEvent::ManifestFailed(reason) => {
                let err = Error::ManifestFetch(reason);
                error!("{}", err);
                self.registry.mark_failed();
                self.transcript.notice("sound library unavailable");
            }
            SessionEvent::ConnectionOpened => {
                self.dispatcher.on_open(&mut self.transcript);
            }
            SessionEvent::TokenReceived(payload) => {
                self.dispatcher
                    .on_delivery(&payload, &mut self.queue, &mut self.transcript);
            }
            SessionEvent::ConnectionClosed(reason) => {
                self.dispatcher.on_close(&reason, &mut self.transcript);
            }
            SessionEvent::PlaybackStarted(id) => match &self.current {
                Some(current) if current.playback == id => {
                    info!("Playing '{}' ({})", current.token, id);
                }
                _ => debug!("Ignoring start of stale playback {}", id),
            },
            SessionEvent::PlaybackEnded(id) => {
                if self.complete(id) {
                    debug!("Playback {} finished", id);
                    self.summary.played += 1;
                }
            }
            SessionEvent::PlaybackFailed { id, reason } => {
                if self.complete(id) {
                    warn!("Playback {} failed: {}", id, reason);
                    self.summary.failed += 1;
                }
            }
            SessionEvent::UserActivated(token) => match self.registry.lookup(token.as_str()) {
                // Only listed sounds can be activated
                Lookup::Found(_) => {
                    self.dispatcher
                        .on_user_activation(token, &mut self.queue, &mut self.transcript);
                }
                Lookup::Pending => debug!("Ignoring activation of '{}' before manifest", token),
                Lookup::NotFound => debug!("Ignoring activation of unlisted '{}'", token),
            },
        }

        if self.is_finished() {
            SessionControl::Finished
        } else {
            SessionControl::Continue
        }
    }

    /// Release the current track if `id` is its playback
    fn complete(&mut self, id: PlaybackId) -> bool {
        match &self.current {
            Some(current) if current.playback == id => {
                self.registry.set_state(current.token.as_str(), AssetState::Idle);
                self.current = None;
                true
            }
            _ => {
                debug!("Ignoring completion of stale playback {}", id);
                false
            }
        }
    }

    /// Advance the queue by at most one token
    pub fn drain(&mut self) -> Drain {
        if self.current.is_some() {
            return Drain::Busy;
        }
        let Some(head) = self.queue.peek() else {
            return Drain::Idle;
        };

        let started = match self.registry.lookup(head.as_str()) {
            Lookup::Pending => return Drain::Deferred,
            Lookup::NotFound => None,
            Lookup::Found(asset) => {
                self.next_playback += 1;
                let id = PlaybackId(self.next_playback);
                Some((id, self.backend.play(id, asset)))
            }
        };

        let Some(token) = self.queue.pop() else {
            return Drain::Idle;
        };

        match started {
            None => {
                warn!("{}, skipping", Error::UnknownToken(token.to_string()));
                self.summary.dropped += 1;
                Drain::Dropped(token)
            }
            Some((id, Ok(()))) => {
                debug!("Requested '{}' as playback {}", token, id);
                self.registry.set_state(token.as_str(), AssetState::Playing);
                self.current = Some(CurrentTrack {
                    token,
                    playback: id,
                });
                Drain::Started(id)
            }
            Some((id, Err(e))) => {
                warn!("Could not start '{}' ({}): {}", token, id, e);
                self.summary.failed += 1;
                Drain::Failed(token)
            }
        }
    }

    /// Event loop: handle events and drain on every tick until finished.
    ///
    /// The drain ticker is cancelled once the connection closes; tokens
    /// still queued at that point never play and are discarded on exit.
    pub async fn run(mut self, mut events: EventReceiver) -> SessionSummary {
        let mut ticker = Some(drain_ticker(self.config.drain_interval));
        info!(
            "Session started (drain every {}ms)",
            self.config.drain_interval.as_millis()
        );

        loop {
            tokio::select! {
                biased;

                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Event channel closed");
                        break;
                    };
                    let control = self.handle_event(event);
                    if self.dispatcher.is_closed() && ticker.take().is_some() {
                        debug!("Drain ticker cancelled");
                    }
                    if control == SessionControl::Finished {
                        break;
                    }
                }
                _ = next_tick(&mut ticker) => {
                    self.drain();
                }
            }
        }

        self.finish()
    }

    /// Discard whatever is still queued and report totals
    pub fn finish(mut self) -> SessionSummary {
        let discarded = self.queue.clear();
        if discarded > 0 {
            info!("Discarding {} pending token(s)", discarded);
        }
        self.summary.discarded += discarded;

        info!(
            "Session ended: {} played, {} dropped, {} failed, {} discarded",
            self.summary.played, self.summary.dropped, self.summary.failed, self.summary.discarded
        );
        self.summary
    }
}

fn drain_ticker(period: Duration) -> Interval {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
