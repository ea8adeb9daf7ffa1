//! Hierarchical task tracking over a dual plain-file store.
//!
//! Task content lives as one JSON record per task under `.trellis/tasks/`;
//! status and dependency edges live in a single side-index snapshot. The two
//! stores share no transaction, so every cross-store mutation runs through
//! the compensating-step protocol in [`mutation`].

pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod mutation;
pub mod output;
pub mod resolver;
pub mod store;
pub mod task_id;
pub mod tree;
