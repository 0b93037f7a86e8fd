//! Lazy image loading.
//!
//! Each image element's bitmap is fetched and decoded at most once per
//! `src`, off the render thread. Results travel back over a channel and are
//! applied by [`ImageLoader::poll`] at the start of a render, so drawing never
//! blocks on I/O. Changing an element's `src` bumps its generation; a result
//! from an older generation is dropped ("latest wins").

use crate::context::Bitmap;
use base64::Engine as _;
use canvink_core::ElementId;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::Duration;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Image loading errors.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("Image has no pixels")]
    EmptyImage,
}

/// Source of encoded image bytes.
pub trait ImageFetcher: Send + Sync + 'static {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, ImageLoadError>;
}

/// Reads filesystem paths (optionally below a root) and base64 `data:` URIs.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, ImageLoadError> {
        if src.starts_with("data:") {
            return decode_data_uri(src);
        }
        let path = match &self.root {
            Some(root) => root.join(src),
            None => PathBuf::from(src),
        };
        if !path.exists() {
            return Err(ImageLoadError::NotFound(path.display().to_string()));
        }
        Ok(std::fs::read(path)?)
    }
}

/// Payload bytes of a `data:<mime>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImageLoadError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ImageLoadError::InvalidDataUri("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageLoadError::InvalidDataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ImageLoadError::InvalidDataUri(format!(
            "unsupported encoding in '{header}'"
        )));
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

/// Decode encoded bytes (PNG, JPEG, WebP) into an RGBA bitmap.
pub fn decode_bitmap(bytes: &[u8]) -> Result<Bitmap, ImageLoadError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Bitmap::from_rgba8(width, height, rgba.into_raw()).ok_or(ImageLoadError::EmptyImage)
}

/// Load state of one element's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// Never requested (or cancelled).
    Unknown,
    Loading,
    Loaded,
    Failed,
}

impl ImageStatus {
    pub fn is_loading(self) -> bool {
        self == ImageStatus::Loading
    }

    pub fn is_loaded(self) -> bool {
        self == ImageStatus::Loaded
    }
}

enum EntryState {
    Loading,
    Loaded(Arc<Bitmap>),
    Failed,
}

struct Entry {
    src: String,
    generation: u64,
    state: EntryState,
}

struct LoadResult {
    id: ElementId,
    generation: u64,
    result: Result<Bitmap, ImageLoadError>,
}

/// Memoized per-element image loader owned by the renderer.
pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    entries: HashMap<ElementId, Entry>,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    next_generation: u64,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("entries", &self.entries.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(Arc::new(FileFetcher::new()))
    }
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (tx, rx) = channel();
        Self {
            fetcher,
            entries: HashMap::new(),
            tx,
            rx,
            next_generation: 0,
        }
    }

    /// Ensure a load of `src` exists for `id` and return its status.
    ///
    /// Repeating a request for the same `src` never starts a second load,
    /// whether the first is in flight, done, or failed.
    pub fn request(&mut self, id: ElementId, src: &str) -> ImageStatus {
        if self.entries.get(&id).is_some_and(|entry| entry.src == src) {
            return self.status(id);
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.entries.insert(
            id,
            Entry {
                src: src.to_string(),
                generation,
                state: EntryState::Loading,
            },
        );
        log::debug!("Loading image for {id} (generation {generation})");
        self.spawn_load(id, generation, src.to_string());
        self.status(id)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_load(&mut self, id: ElementId, generation: u64, src: String) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name("canvink-image".to_string())
            .spawn(move || {
                let result = fetcher.fetch(&src).and_then(|bytes| decode_bitmap(&bytes));
                // Receiver gone means the loader was dropped.
                let _ = tx.send(LoadResult {
                    id,
                    generation,
                    result,
                });
            });
        if let Err(err) = spawned {
            log::warn!("Failed to spawn image loader thread: {err}");
            self.apply(LoadResult {
                id,
                generation,
                result: Err(ImageLoadError::Io(err)),
            });
        }
    }

    /// No threads on the web: load inline, deliver through the channel.
    #[cfg(target_arch = "wasm32")]
    fn spawn_load(&mut self, id: ElementId, generation: u64, src: String) {
        let result = self.fetcher.fetch(&src).and_then(|bytes| decode_bitmap(&bytes));
        let _ = self.tx.send(LoadResult {
            id,
            generation,
            result,
        });
    }

    /// Apply finished loads. Returns how many results were accepted.
    pub fn poll(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(result) = self.rx.try_recv() {
            if self.apply(result) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Block until `id` stops loading or `timeout` elapses.
    pub fn wait(&mut self, id: ElementId, timeout: Duration) -> ImageStatus {
        let deadline = Instant::now() + timeout;
        self.poll();
        while self.status(id).is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(result) => {
                    self.apply(result);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        self.status(id)
    }

    fn apply(&mut self, result: LoadResult) -> bool {
        let Some(entry) = self.entries.get_mut(&result.id) else {
            log::debug!("Dropping image result for cancelled element {}", result.id);
            return false;
        };
        if entry.generation != result.generation {
            log::debug!(
                "Dropping superseded image result for {} (generation {} < {})",
                result.id,
                result.generation,
                entry.generation
            );
            return false;
        }
        entry.state = match result.result {
            Ok(bitmap) => EntryState::Loaded(Arc::new(bitmap)),
            Err(err) => {
                log::warn!("Failed to load image '{}': {err}", entry.src);
                EntryState::Failed
            }
        };
        true
    }

    pub fn status(&self, id: ElementId) -> ImageStatus {
        self.entries
            .get(&id)
            .map_or(ImageStatus::Unknown, Entry::status)
    }

    /// Decoded bitmap for `id`, if loaded.
    pub fn bitmap(&self, id: ElementId) -> Option<Arc<Bitmap>> {
        match &self.entries.get(&id)?.state {
            EntryState::Loaded(bitmap) => Some(Arc::clone(bitmap)),
            _ => None,
        }
    }

    /// Number of loads still in flight.
    pub fn in_flight(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry.state, EntryState::Loading))
            .count()
    }

    /// Forget `id`; a late result for it is discarded.
    pub fn cancel(&mut self, id: ElementId) {
        self.entries.remove(&id);
    }

    /// Forget every entry whose id is not in `live`. Returns how many were
    /// dropped.
    pub fn retain(&mut self, live: &HashSet<ElementId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            log::debug!("Evicted {dropped} image entries for removed elements");
        }
        dropped
    }

    /// Forget every entry.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }
}

impl Entry {
    fn status(&self) -> ImageStatus {
        match self.state {
            EntryState::Loading => ImageStatus::Loading,
            EntryState::Loaded(_) => ImageStatus::Loaded,
            EntryState::Failed => ImageStatus::Failed,
        }
    }
}
