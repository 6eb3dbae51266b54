//! StreamStore 実装

pub mod fs;

pub use fs::FsStreamStore;
