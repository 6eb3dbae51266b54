//! Domain layer: value objects, entities and the interfaces the relay depends on.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod stream_store;
pub mod value_object;

pub use entity::{Group, Member};
pub use error::{MessagePushError, StreamStoreError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use repository::GroupRepository;
pub use stream_store::{StreamEntry, StreamStore};
pub use value_object::{GroupName, Sample, SubscriberId, SubscriberIdFactory, Timestamp};
