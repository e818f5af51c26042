//! Device-backed playback backend
//!
//! [`AudioPlayer`] owns a dedicated `audio-output` thread holding the cpal
//! stream. The stream callback pulls frames from a shared [`Deck`] holding
//! at most one active clip, and reports start/end of that clip to the
//! session through the event channel.
//!
//! Play requests resolve the clip (preloaded or fetched on demand) in a
//! spawned task, so `play` returns immediately.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::audio::loader::ClipLoader;
use crate::audio::output::AudioOutput;
use crate::audio::types::{AudioFrame, Clip};
use crate::config::AudioSettings;
use crate::error::{Error, Result};
use crate::events::{EventSender, PlaybackId, SessionEvent};
use crate::playback::{AudioAsset, PlaybackBackend};

/// Clip currently feeding the output stream
#[derive(Debug)]
struct ActiveClip {
    id: PlaybackId,
    clip: Arc<Clip>,
    position: usize,
    started: bool,
}

/// Single-slot source for the output callback
#[derive(Debug, Default)]
pub struct Deck {
    active: Option<ActiveClip>,
}

impl Deck {
    /// Put a clip on the deck. Returns the id of a clip that was still
    /// active and got replaced.
    pub fn load(&mut self, id: PlaybackId, clip: Arc<Clip>) -> Option<PlaybackId> {
        let replaced = self.active.take().map(|a| a.id);
        self.active = Some(ActiveClip {
            id,
            clip,
            position: 0,
            started: false,
        });
        replaced
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Fill `frames` from the active clip, leaving silence after its end.
    ///
    /// Emits `PlaybackStarted` on the first buffer of a clip and
    /// `PlaybackEnded` on the buffer that consumes its last frame.
    pub fn fill(&mut self, frames: &mut [AudioFrame], events: &EventSender) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        if !active.started {
            active.started = true;
            let _ = events.send(SessionEvent::PlaybackStarted(active.id));
        }

        for frame in frames.iter_mut() {
            match active.clip.frame(active.position) {
                Some(next) => {
                    *frame = next;
                    active.position += 1;
                }
                None => break,
            }
        }

        if active.position >= active.clip.frame_count() {
            let id = active.id;
            self.active = None;
            let _ = events.send(SessionEvent::PlaybackEnded(id));
        }
    }
}

/// Lock the deck, recovering it if a holder panicked. Poison is cleared,
/// so the warning is logged once.
fn lock_deck(deck: &Mutex<Deck>) -> MutexGuard<'_, Deck> {
    deck.lock().unwrap_or_else(|poisoned| {
        warn!("Output deck lock was poisoned; recovering");
        deck.clear_poison();
        poisoned.into_inner()
    })
}

/// Playback backend driving the default (or configured) output device
pub struct AudioPlayer {
    loader: ClipLoader,
    deck: Arc<Mutex<Deck>>,
    events: EventSender,
    shutdown: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioPlayer {
    /// Open the output device on its own thread and start the stream.
    ///
    /// Blocks until the device is open so configuration errors surface here.
    pub fn open(settings: &AudioSettings, http: reqwest::Client, events: EventSender) -> Result<Self> {
        let deck = Arc::new(Mutex::new(Deck::default()));
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<u32>>();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        let thread_deck = Arc::clone(&deck);
        let thread_events = events.clone();
        let device = settings.device.clone();
        let volume = settings.volume;

        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let mut output = match AudioOutput::open(device.as_deref(), volume) {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let started = output.start(move |frames| {
                    lock_deck(&thread_deck).fill(frames, &thread_events);
                });
                if let Err(e) = started {
                    let _ = ready_tx.send(Err(e));
                    return;
                }

                let _ = ready_tx.send(Ok(output.sample_rate()));

                // Hold the stream until the player goes away
                let _ = shutdown_rx.recv();
                debug!("Audio output thread exiting");
            })?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| Error::AudioOutput("Audio output thread exited during startup".to_string()))??;

        info!("Audio output ready at {}Hz", sample_rate);

        Ok(Self {
            loader: ClipLoader::new(http, sample_rate),
            deck,
            events,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.loader.output_rate()
    }
}

impl PlaybackBackend for AudioPlayer {
    fn preload(&mut self, asset: &AudioAsset) {
        let slot = asset.clip_slot();
        let loader = self.loader.clone();
        let url = asset.url().clone();
        let token = asset.token().clone();

        tokio::spawn(async move {
            if let Err(e) = slot.get_or_load(&loader, &url).await {
                warn!("Preload of '{}' failed: {}", token, e);
            }
        });
    }

    fn play(&mut self, id: PlaybackId, asset: &AudioAsset) -> Result<()> {
        let slot = asset.clip_slot();
        let loader = self.loader.clone();
        let url = asset.url().clone();
        let deck = Arc::clone(&self.deck);
        let events = self.events.clone();

        tokio::spawn(async move {
            let outcome = match slot.get_or_load(&loader, &url).await {
                Ok(clip) => {
                    if let Some(replaced) = lock_deck(&deck).load(id, clip) {
                        warn!("Playback {} replaced unfinished playback {}", id, replaced);
                    }
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            };

            if let Err(reason) = outcome {
                let _ = events.send(SessionEvent::PlaybackFailed { id, reason });
            }
        });

        Ok(())
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        // Closing the channel releases the output thread
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;

    fn clip(frames: usize) -> Arc<Clip> {
        let samples = (0..frames * 2).map(|i| i as f32 / 1000.0).collect();
        Arc::new(Clip::new(samples, 44100))
    }

    #[test]
    fn test_idle_deck_leaves_silence() {
        let (tx, mut rx) = events::channel();
        let mut deck = Deck::default();
        let mut frames = vec![AudioFrame::zero(); 4];

        deck.fill(&mut frames, &tx);

        assert!(frames.iter().all(|f| *f == AudioFrame::zero()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_deck_reports_start_then_end() {
        let (tx, mut rx) = events::channel();
        let mut deck = Deck::default();
        deck.load(PlaybackId(7), clip(6));

        let mut frames = vec![AudioFrame::zero(); 4];
        deck.fill(&mut frames, &tx);
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::PlaybackStarted(PlaybackId(7)))));
        assert!(rx.try_recv().is_err());
        assert_eq!(frames[1], AudioFrame::from_stereo(0.002, 0.003));

        let mut frames = vec![AudioFrame::zero(); 4];
        deck.fill(&mut frames, &tx);
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::PlaybackEnded(PlaybackId(7)))));
        // Tail of the buffer after the clip is silence
        assert_eq!(frames[2], AudioFrame::zero());
        assert!(deck.is_idle());
    }

    #[test]
    fn test_deck_load_reports_replaced() {
        let mut deck = Deck::default();
        assert_eq!(deck.load(PlaybackId(1), clip(2)), None);
        assert_eq!(deck.load(PlaybackId(2), clip(2)), Some(PlaybackId(1)));
    }

    #[test]
    fn test_poisoned_deck_keeps_playing() {
        let (tx, mut rx) = events::channel();
        let deck = Arc::new(Mutex::new(Deck::default()));

        let poisoner = Arc::clone(&deck);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("callback panicked");
        })
        .join();
        assert!(deck.is_poisoned());

        lock_deck(&deck).load(PlaybackId(1), clip(2));
        let mut frames = vec![AudioFrame::zero(); 4];
        lock_deck(&deck).fill(&mut frames, &tx);

        assert!(!deck.is_poisoned());
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::PlaybackStarted(PlaybackId(1)))));
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::PlaybackEnded(PlaybackId(1)))));
    }
}
