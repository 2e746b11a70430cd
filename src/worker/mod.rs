//! # Worker orchestration.
//!
//! Producers are heterogeneous: some poll on a schedule, some sit on bus
//! watches, some bridge to the pub/sub side. The [`WorkerManager`] starts
//! any number of them under one root cancellation token, tolerates
//! individual start failures, and presents their combined output as a
//! single merged stream.
//!
//! ## Architecture
//! ```text
//!  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//!  │ EntityWorker │  │ EntityWorker │  │ EntityWorker │   (producers)
//!  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!         ▼                 ▼                 ▼
//!  ┌───────────────────────────────────────────────────┐
//!  │ WorkerManager                                     │
//!  │  - child CancellationToken per worker             │
//!  │  - start failure → warn + skip (batch continues)  │
//!  │  - one copy task per stream (fan-in)              │
//!  └──────────────────────┬────────────────────────────┘
//!                         ▼
//!               merged Entity stream ──► Dispatcher
//! ```
//!
//! No ordering is guaranteed across producers; within one producer's
//! stream, order is preserved end-to-end.

mod contract;
mod manager;

pub use contract::{
    EntityWorker, PubSubBundle, PubSubConfig, PubSubMessage, PubSubSubscription, PubSubWorker,
};
pub use manager::WorkerManager;
