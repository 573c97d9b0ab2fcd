pub mod track;

pub use track::{Track, TrackId};
