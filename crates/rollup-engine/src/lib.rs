// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Incremental multi-level map-reduce materialization.
//!
//! Map outputs are stored per document and bucket, aggregated into level-1
//! results per bucket and into level-2 results across buckets. Changing a
//! document only schedules the buckets it touched for re-aggregation.

mod bucket;
mod config;
mod cursor;
mod engine;
mod mapped;
mod model;
mod reduced;
mod row;
mod schedule;
mod stats;
mod view;

pub use bucket::BucketAssignment;
pub use config::{EngineBuilder, EngineConfig};
pub use cursor::ReduceCursor;
pub use engine::{MapReduceActions, MapReduceEngine};
pub use model::{
	MappedResultInfo, ReduceKeyAndBucket, ReduceKeyAndCount, ReduceType, ReduceTypePerKey, ScheduledItem,
	ScheduledReductionDebugInfo, ScheduledReductionInfo, ViewDeletion,
};
pub use rollup_core::{Error, Result};
