//! ECG viewer.
//!
//! A viewer loads one recorded stream, plays it back one sample per tick, draws it into
//! a rolling window with an erase gap ahead of the cursor and relays every sample to the
//! group named after the viewer, so that other connections in the group draw it too.

pub mod config;
pub mod error;
pub mod formatter;
pub mod pacer;
pub mod reconnect;
pub mod registry;
pub mod relay;
pub mod renderer;
pub mod runner;
pub mod session;
pub mod source;
mod ui;

pub use config::{ChartLayout, PlaybackConfig};
pub use error::ClientError;
pub use pacer::{Pacer, PlaybackState};
pub use registry::ViewerRegistry;
pub use renderer::RollingWindow;
pub use session::{SessionStatus, ViewerSession};
