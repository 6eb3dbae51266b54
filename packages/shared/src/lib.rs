//! Utilities shared by the ecg-live server and client.

pub mod logger;
pub mod time;
