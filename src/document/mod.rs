mod core;

pub use self::core::{
    Document, Element, ElementId, ElementKind, ElementState, MediaState, PlaybackError,
    ReadyState,
};
