pub mod event;

pub use event::{Event, EventFilter, EventPatch, NewEvent, Period};
