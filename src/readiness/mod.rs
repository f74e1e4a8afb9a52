//! Media readiness watcher.
//!
//! Collapses four racing sources (no media, already buffered, two one-shot
//! media notifications, and a hard timeout) into a single first-settled-wins
//! latch. The watcher only records; it never drives the page itself.

use crate::document::{Document, ReadyState};

/// Buffering level at which media counts as ready without waiting.
pub const READY_THRESHOLD: ReadyState = ReadyState::HaveFutureData;

/// Notifications a media element can deliver while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSignal {
    /// Enough data is buffered to play through without stalling.
    CanPlayThrough,
    /// The first frame is available.
    LoadedData,
}

impl MediaSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSignal::CanPlayThrough => "canplaythrough",
            MediaSignal::LoadedData => "loadeddata",
        }
    }
}

/// What settled the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySource {
    NoMedia,
    AlreadyBuffered,
    Signal(MediaSignal),
    Timeout,
}

impl ReadySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadySource::NoMedia => "no_media",
            ReadySource::AlreadyBuffered => "already_buffered",
            ReadySource::Signal(signal) => signal.as_str(),
            ReadySource::Timeout => "timeout",
        }
    }
}

/// Boolean that goes false to true at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessLatch {
    settled_by: Option<ReadySource>,
}

impl ReadinessLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.settled_by.is_some()
    }

    pub fn settled_by(&self) -> Option<ReadySource> {
        self.settled_by
    }

    /// Returns true only for the call that flipped the latch.
    pub fn settle(&mut self, source: ReadySource) -> bool {
        if self.settled_by.is_some() {
            return false;
        }
        self.settled_by = Some(source);
        true
    }
}

#[derive(Debug, Clone)]
pub struct MediaWatcher {
    media: Option<String>,
    latch: ReadinessLatch,
    can_play_through_armed: bool,
    loaded_data_armed: bool,
}

impl MediaWatcher {
    /// Inspect `media` in `document` and arm whatever is still needed.
    ///
    /// An id that does not name a media element is treated as absent.
    pub fn attach(document: &Document, media: Option<&str>) -> Self {
        let mut watcher = Self {
            media: None,
            latch: ReadinessLatch::new(),
            can_play_through_armed: false,
            loaded_data_armed: false,
        };

        let state = media.and_then(|id| document.media(id).map(|state| (id, state)));
        match state {
            None => {
                watcher.latch.settle(ReadySource::NoMedia);
            }
            Some((id, state)) => {
                watcher.media = Some(id.to_string());
                if state.ready_state >= READY_THRESHOLD {
                    watcher.latch.settle(ReadySource::AlreadyBuffered);
                } else {
                    watcher.can_play_through_armed = true;
                    watcher.loaded_data_armed = true;
                }
            }
        }
        watcher
    }

    pub fn media(&self) -> Option<&str> {
        self.media.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.latch.is_set()
    }

    pub fn settled_by(&self) -> Option<ReadySource> {
        self.latch.settled_by()
    }

    pub fn is_armed(&self, signal: MediaSignal) -> bool {
        match signal {
            MediaSignal::CanPlayThrough => self.can_play_through_armed,
            MediaSignal::LoadedData => self.loaded_data_armed,
        }
    }

    /// Deliver a media notification. Each registration is consumed on its
    /// first delivery; returns true if this delivery flipped the latch.
    pub fn observe(&mut self, signal: MediaSignal) -> bool {
        let armed = match signal {
            MediaSignal::CanPlayThrough => &mut self.can_play_through_armed,
            MediaSignal::LoadedData => &mut self.loaded_data_armed,
        };
        if !std::mem::replace(armed, false) {
            return false;
        }
        self.latch.settle(ReadySource::Signal(signal))
    }

    /// The hard ceiling elapsed; returns true if it flipped the latch.
    pub fn time_out(&mut self) -> bool {
        self.latch.settle(ReadySource::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use proptest::prelude::*;

    fn doc_with(state: ReadyState) -> Document {
        Document::new()
            .with_element(Element::media("hero-video", state))
            .unwrap()
    }

    #[test]
    fn missing_media_is_ready_immediately() {
        let watcher = MediaWatcher::attach(&Document::new(), Some("hero-video"));
        assert!(watcher.is_ready());
        assert_eq!(watcher.settled_by(), Some(ReadySource::NoMedia));
        assert_eq!(watcher.media(), None);
    }

    #[test]
    fn non_media_element_counts_as_absent() {
        let doc = Document::new()
            .with_element(Element::block("hero-video"))
            .unwrap();
        let watcher = MediaWatcher::attach(&doc, Some("hero-video"));
        assert_eq!(watcher.settled_by(), Some(ReadySource::NoMedia));
    }

    #[test]
    fn buffered_media_is_ready_immediately() {
        let watcher = MediaWatcher::attach(&doc_with(ReadyState::HaveFutureData), Some("hero-video"));
        assert_eq!(watcher.settled_by(), Some(ReadySource::AlreadyBuffered));
        assert!(!watcher.is_armed(MediaSignal::CanPlayThrough));
    }

    #[test]
    fn loading_media_arms_both_signals() {
        let mut watcher =
            MediaWatcher::attach(&doc_with(ReadyState::HaveCurrentData), Some("hero-video"));
        assert!(!watcher.is_ready());
        assert!(watcher.is_armed(MediaSignal::LoadedData));

        assert!(watcher.observe(MediaSignal::LoadedData));
        assert!(!watcher.is_armed(MediaSignal::LoadedData));
        assert!(!watcher.observe(MediaSignal::CanPlayThrough));
        assert!(!watcher.is_armed(MediaSignal::CanPlayThrough));
        assert_eq!(
            watcher.settled_by(),
            Some(ReadySource::Signal(MediaSignal::LoadedData))
        );
    }

    #[test]
    fn timeout_wins_when_nothing_else_fires() {
        let mut watcher = MediaWatcher::attach(&doc_with(ReadyState::HaveNothing), Some("hero-video"));
        assert!(watcher.time_out());
        assert!(!watcher.observe(MediaSignal::CanPlayThrough));
        assert_eq!(watcher.settled_by(), Some(ReadySource::Timeout));
    }

    #[derive(Debug, Clone, Copy)]
    enum Input {
        Signal(MediaSignal),
        Timeout,
    }

    fn input() -> impl Strategy<Value = Input> {
        prop_oneof![
            Just(Input::Signal(MediaSignal::CanPlayThrough)),
            Just(Input::Signal(MediaSignal::LoadedData)),
            Just(Input::Timeout),
        ]
    }

    proptest! {
        #[test]
        fn latch_flips_at_most_once_in_any_order(inputs in prop::collection::vec(input(), 0..12)) {
            let mut watcher = MediaWatcher::attach(&doc_with(ReadyState::HaveMetadata), Some("hero-video"));
            let mut flips = 0;
            let mut was_ready = false;
            for input in inputs {
                let flipped = match input {
                    Input::Signal(signal) => watcher.observe(signal),
                    Input::Timeout => watcher.time_out(),
                };
                if flipped {
                    flips += 1;
                }
                prop_assert!(!(was_ready && !watcher.is_ready()));
                was_ready = watcher.is_ready();
            }
            prop_assert!(flips <= 1);
            prop_assert_eq!(flips == 1, watcher.is_ready());
        }
    }
}
