/// Common error types: listener failures surfaced by broadcast.
pub mod error;
/// Pub/Sub core: Broker, Channel handle, Listener, Message.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Operation errors and result types.
pub use error::{BroadcastError, ListenerError, ListenerResult};
/// Pub/Sub API.
pub use pubsub::{
    callback, channel, default_broker, Broker, Callback, Channel, Context, Listener, Message, Value,
};
