pub mod broadcast;

pub use broadcast::{BroadcastError, ListenerError, ListenerResult};
