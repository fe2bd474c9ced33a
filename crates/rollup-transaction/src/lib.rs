// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Single-writer transactional storage over an ordered key-value backend.
//!
//! Writes are buffered in a [`CommandTransaction`] and applied atomically on
//! commit. Reads inside a transaction observe its own pending writes.

mod command;
mod config;
mod id;
mod idle;
mod iter;
mod metrics;
mod pending;
mod query;
mod storage;

pub use command::CommandTransaction;
pub use config::{IdleConfig, StorageConfig};
pub use id::TransactionId;
pub use iter::RangeIter;
pub use metrics::TransactionMetrics;
pub use pending::Pending;
pub use query::QueryTransaction;
pub use storage::{CommitHook, TransactionalStorage};
