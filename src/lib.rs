//! # hostlink — concurrent collection-and-delivery runtime for host telemetry.
//!
//! A host agent needs to watch many independent local data sources (bus
//! signals, polled readings, one-shot probes), merge everything they produce
//! into one stream, and deliver each item to a remote consumer while keeping
//! a durable record of what has been registered and what is disabled. This
//! crate is that runtime: producers, fan-in, scheduling, registration state
//! and dispatch, all under one cancellation tree.
//!
//! ## Architecture
//! ```text
//!                 ┌────────────┐
//!                 │ Scheduler  │ cron / interval / jitter triggers
//!                 └─────┬──────┘
//!                       │ fires
//!  ┌───────────┐  ┌─────▼──────┐  ┌───────────┐
//!  │ bus Watch │  │ polling    │  │ other     │   EntityWorker producers
//!  │ producer  │  │ producer   │  │ producers │
//!  └─────┬─────┘  └─────┬──────┘  └─────┬─────┘
//!        └──────────────┼───────────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │ WorkerManager   │ child token per worker, fan-in merge
//!              └────────┬────────┘
//!                       ▼  merged Entity stream
//!              ┌─────────────────┐      ┌───────────┐
//!              │ Dispatcher      │◄────►│ Registry  │ durable flags
//!              └────────┬────────┘      └───────────┘
//!                       ▼
//!                  Delivery (remote consumer, supplied by the host)
//! ```
//!
//! ## Core pieces
//!
//! | Component | Role |
//! |-----------|------|
//! | [`Bus`], [`Property`], [`Method`], [`Watch`] | typed access to the local inter-process bus |
//! | [`Scheduler`], [`ScheduleTrigger`] | cron / interval / jittered job execution |
//! | [`Registry`] | durable per-entity registration and disabled flags |
//! | [`WorkerManager`], [`EntityWorker`] | producer lifecycle and stream fan-in |
//! | [`Dispatcher`], [`Delivery`] | classification, registration, reconciliation, delivery |
//!
//! ## Quick start
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use hostlink::{Dispatcher, Registry, Scheduler, WorkerManager};
//!
//! # async fn run(workers: Vec<Arc<dyn hostlink::EntityWorker>>,
//! #              delivery: Arc<dyn hostlink::Delivery>,
//! # ) -> Result<(), hostlink::RegistryError> {
//! let root = CancellationToken::new();
//! let scheduler = Scheduler::start(root.clone());
//! let registry = Arc::new(Registry::load("/var/lib/agent")?);
//!
//! let manager = WorkerManager::new();
//! let merged = manager.start_entity_workers(&root, &workers).await;
//!
//! let dispatcher = Dispatcher::new(registry, delivery);
//! dispatcher.run(root.clone(), merged).await;
//! # let _ = scheduler;
//! # Ok(())
//! # }
//! ```
//!
//! Shutdown is cooperative everywhere: cancel the root token and every
//! producer, copy task, scheduled job and the dispatch loop winds down;
//! the merged stream closes exactly once after the last producer exits.

pub mod bus;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod worker;

pub use bus::{
    has_property_changed, parse_properties_changed, parse_value_change, ArgDirection, ArgSpec,
    Bus, BusConnection, BusKind, BusValue, InterfaceSpec, Introspection, MatchRule, Method,
    MethodSpec, Properties, Property, Signal, Trigger, ValueChange, Watch, PROP_CHANGED_MEMBER,
    PROP_INTERFACE,
};
pub use dispatch::{Delivery, Dispatcher};
pub use error::{BusError, DeliveryError, RegistryError, ScheduleError, WorkerError};
pub use models::{Entity, EntityCategory, EventData, LocationUpdate, SensorUpdate};
pub use registry::{Registry, RegistryRecord};
pub use scheduler::{Job, JobFn, JobKey, ScheduleTrigger, Scheduler};
pub use worker::{
    EntityWorker, PubSubBundle, PubSubConfig, PubSubMessage, PubSubSubscription, PubSubWorker,
    WorkerManager,
};
