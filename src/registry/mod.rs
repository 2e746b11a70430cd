//! # Durable registration state.
//!
//! The [`Registry`] remembers, per entity ID, whether the entity has been
//! registered with the remote side and whether it is currently disabled.
//! That makes registration effectively-once and lets the dispatcher filter
//! disabled entities before spending a network call.
//!
//! The backing store is a single bincode-encoded map on disk. Every
//! mutation rewrites the whole file under one mutex before returning — no
//! append log, no partial update. O(total entities) per write is fine at
//! this scale (tens of entities, not millions), and a crash immediately
//! after a successful `set_registered` cannot lose the update.

mod store;

pub use store::{Registry, RegistryRecord};
