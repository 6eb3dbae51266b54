//! Real-time ECG sample relay.
//!
//! This library provides the group publish/subscribe hub used by ecg-live viewers:
//! connections join named groups and every sample published to a group is pushed to
//! all of its current members.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
