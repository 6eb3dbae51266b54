//! InMemory Repository 実装

pub mod group;

pub use group::InMemoryGroupRepository;
