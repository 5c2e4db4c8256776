use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::state::PlaybackState;
use crate::traits::decoder::{AudioDecoder, CompletionCallback, PreparedCallback};

/// Listener receiving the source (path or URL) it is about.
pub type SourceListener = Arc<dyn Fn(&str) + Send + Sync + 'static>;

type DecoderFactory<D> = Box<dyn Fn() -> D + Send + Sync + 'static>;

/// Mutable playback state, shared with decoder callbacks.
struct PlayerState<D> {
    decoder: Option<D>,
    source: String,
    prepared: bool,
    paused: bool,
    /// Bumped on every prepare and release so late callbacks from an
    /// abandoned decoder can be recognized and dropped.
    generation: u64,
    on_prepared: Option<SourceListener>,
    on_completion: Option<SourceListener>,
}

impl<D: AudioDecoder> PlayerState<D> {
    /// Detach the current decoder. The caller releases it once the state
    /// lock is dropped.
    fn take_decoder(&mut self) -> Option<D> {
        self.prepared = false;
        self.paused = false;
        self.generation += 1;
        self.decoder.take()
    }

    fn completion_notice(&self) -> Option<(SourceListener, String)> {
        self.on_completion
            .clone()
            .map(|listener| (listener, self.source.clone()))
    }
}

/// Transport controls over a single asynchronously prepared decoder.
///
/// Explicitly constructed and owned; share it with `Arc` if several
/// components need playback. All state sits behind one mutex that both
/// callers and decoder callbacks go through. Listeners are always invoked
/// and decoders always released after that mutex is dropped, so listeners
/// may call back into the controller and a decoder's `release` may wait
/// for its callback thread.
pub struct PlaybackController<D: AudioDecoder> {
    factory: DecoderFactory<D>,
    state: Arc<Mutex<PlayerState<D>>>,
}

impl<D: AudioDecoder> PlaybackController<D> {
    /// `factory` builds a fresh decoder for every prepare cycle.
    pub fn new(factory: impl Fn() -> D + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            state: Arc::new(Mutex::new(PlayerState {
                decoder: None,
                source: String::new(),
                prepared: false,
                paused: false,
                generation: 0,
                on_prepared: None,
                on_completion: None,
            })),
        }
    }

    /// Called with the source once it is prepared and playback has started.
    pub fn set_prepared_listener(&self, listener: impl Fn(&str) + Send + Sync + 'static) {
        self.state.lock().on_prepared = Some(Arc::new(listener));
    }

    /// Called when a source finishes playing, or when it is abandoned for
    /// another `play` before it got to play.
    pub fn set_completion_listener(&self, listener: impl Fn(&str) + Send + Sync + 'static) {
        self.state.lock().on_completion = Some(Arc::new(listener));
    }

    /// Play `path` (a file path or URL).
    ///
    /// For the source already loaded this restarts, resumes, or re-prepares
    /// as appropriate. Any other source replaces the current one. Preparation
    /// is asynchronous: playback starts when the decoder reports it is ready.
    pub fn play(&self, path: &str) -> Result<(), CaptureError> {
        let mut notice = None;
        let mut retired = Vec::new();
        let result = {
            let mut s = self.state.lock();
            if s.source == path {
                if s.decoder.is_none() {
                    self.prepare(&mut s, path, &mut retired)
                } else if s.prepared {
                    Self::restart_or_resume(&mut s)
                } else {
                    log::debug!("Restarting preparation of {}", path);
                    notice = s.completion_notice();
                    retired.extend(s.take_decoder());
                    self.prepare(&mut s, path, &mut retired)
                }
            } else {
                if s.decoder.is_some() {
                    notice = s.completion_notice();
                }
                retired.extend(s.take_decoder());
                self.prepare(&mut s, path, &mut retired)
            }
        };

        release_all(retired);
        if let Some((listener, source)) = notice {
            listener(&source);
        }
        result
    }

    pub fn pause(&self) -> Result<(), CaptureError> {
        let mut s = self.state.lock();
        if !s.prepared {
            log::warn!("Couldn't pause: nothing prepared");
            return Ok(());
        }
        if let Some(decoder) = s.decoder.as_mut() {
            decoder.pause()?;
        }
        s.paused = true;
        Ok(())
    }

    /// Halt playback and drop the decoder. A no-op unless something is
    /// prepared and currently playing.
    pub fn stop(&self) -> Result<(), CaptureError> {
        let (result, retired) = {
            let mut s = self.state.lock();
            let playing = s.prepared && s.decoder.as_ref().is_some_and(|d| d.is_playing());
            if !playing {
                log::debug!("stop ignored: not playing");
                return Ok(());
            }
            let result = match s.decoder.as_mut() {
                Some(decoder) => decoder.stop(),
                None => Ok(()),
            };
            (result, s.take_decoder())
        };
        release_all(retired);
        result
    }

    pub fn seek_to_start(&self) -> Result<(), CaptureError> {
        let mut s = self.state.lock();
        if !s.prepared {
            log::warn!("Couldn't seek to start: nothing prepared");
            return Ok(());
        }
        match s.decoder.as_mut() {
            Some(decoder) => decoder.seek_to(Duration::ZERO),
            None => Ok(()),
        }
    }

    /// Tear down the decoder. Safe in any state; pending callbacks for the
    /// released decoder are ignored.
    pub fn release(&self) {
        let retired = self.state.lock().take_decoder();
        release_all(retired);
    }

    pub fn is_playing(&self) -> bool {
        let s = self.state.lock();
        s.prepared && s.decoder.as_ref().is_some_and(|d| d.is_playing())
    }

    pub fn is_prepared_for(&self, path: &str) -> bool {
        let s = self.state.lock();
        s.prepared && s.source == path
    }

    /// The source most recently passed to `play`, if any.
    pub fn current_source(&self) -> Option<String> {
        let s = self.state.lock();
        (!s.source.is_empty()).then(|| s.source.clone())
    }

    pub fn state(&self) -> PlaybackState {
        let s = self.state.lock();
        match &s.decoder {
            None => PlaybackState::Idle,
            Some(_) if !s.prepared => PlaybackState::Preparing,
            Some(decoder) if decoder.is_playing() => PlaybackState::Playing,
            Some(_) if s.paused => PlaybackState::Paused,
            Some(_) => PlaybackState::Prepared,
        }
    }

    // --- Internal helpers ---

    fn restart_or_resume(s: &mut PlayerState<D>) -> Result<(), CaptureError> {
        let Some(decoder) = s.decoder.as_mut() else {
            return Ok(());
        };
        if decoder.is_playing() {
            decoder.seek_to(Duration::ZERO)
        } else {
            decoder.start()?;
            s.paused = false;
            Ok(())
        }
    }

    /// Create a decoder for `path` and start preparing it. A decoder that
    /// fails to prepare is pushed onto `retired` for release after unlock.
    fn prepare(&self, s: &mut PlayerState<D>, path: &str, retired: &mut Vec<D>) -> Result<(), CaptureError> {
        s.generation += 1;
        let generation = s.generation;
        s.source = path.to_string();
        s.prepared = false;
        s.paused = false;

        let weak = Arc::downgrade(&self.state);
        let on_prepared: PreparedCallback = {
            let weak = weak.clone();
            Box::new(move || handle_prepared(&weak, generation))
        };
        let on_completion: CompletionCallback = Arc::new(move || handle_completion(&weak, generation));

        let mut decoder = (self.factory)();
        match decoder.prepare_async(path, on_prepared, on_completion) {
            Ok(()) => {
                s.decoder = Some(decoder);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to prepare {}: {}", path, e);
                retired.push(decoder);
                s.source.clear();
                Err(e)
            }
        }
    }
}

impl<D: AudioDecoder> Drop for PlaybackController<D> {
    fn drop(&mut self) {
        let retired = self.state.lock().take_decoder();
        release_all(retired);
    }
}

fn release_all<D: AudioDecoder>(decoders: impl IntoIterator<Item = D>) {
    for mut decoder in decoders {
        decoder.release();
    }
}

/// Decoder finished preparing: mark prepared, auto-start, notify.
fn handle_prepared<D: AudioDecoder>(state: &Weak<Mutex<PlayerState<D>>>, generation: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let notice = {
        let mut s = state.lock();
        if s.generation != generation {
            log::debug!("Ignoring prepared callback from an abandoned decoder");
            return;
        }
        let Some(decoder) = s.decoder.as_mut() else {
            return;
        };
        if let Err(e) = decoder.start() {
            log::error!("Failed to start {}: {}", s.source, e);
            return;
        }
        s.prepared = true;
        s.on_prepared
            .clone()
            .map(|listener| (listener, s.source.clone()))
    };

    if let Some((listener, source)) = notice {
        listener(&source);
    }
}

/// Decoder reached the end of its source.
fn handle_completion<D: AudioDecoder>(state: &Weak<Mutex<PlayerState<D>>>, generation: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let notice = {
        let mut s = state.lock();
        if s.generation != generation {
            return;
        }
        s.paused = false;
        s.completion_notice()
    };

    if let Some((listener, source)) = notice {
        listener(&source);
    }
}
