pub mod event;

pub use event::{EventService, ListEventsParams};
