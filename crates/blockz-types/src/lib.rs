#![warn(clippy::pedantic)]

pub mod event;
pub mod listener;

pub use event::{Event, EventKind};
pub use listener::{Listener, ListenerError, Listeners};
