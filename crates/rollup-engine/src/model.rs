// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_core::{SequenceId, Timestamp, key::ScheduledReductionKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the reduction driver aggregates a reduce key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceType {
	#[default]
	None,
	/// Level-0 rows reduce straight into the final result.
	SingleStep,
	/// Reduction goes through level 1 and level 2.
	MultiStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReduceKeyAndBucket {
	pub bucket: i32,
	pub reduce_key: String,
}

impl ReduceKeyAndBucket {
	pub fn new(bucket: i32, reduce_key: impl Into<String>) -> Self {
		Self {
			bucket,
			reduce_key: reduce_key.into(),
		}
	}
}

/// A stored map or reduce result as handed to the reduction driver.
///
/// A record without an etag is the empty-aggregate marker: the bucket was
/// asked for but holds no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedResultInfo {
	pub reduce_key: String,
	pub bucket: i32,
	/// Document id for mapped results, source bucket for reduced results.
	pub source: Option<String>,
	pub etag: Option<SequenceId>,
	pub timestamp: Option<Timestamp>,
	/// Encoded payload size in bytes.
	pub size: usize,
	pub data: Option<Value>,
}

impl MappedResultInfo {
	pub(crate) fn empty_aggregate(reduce_key: &str, bucket: i32) -> Self {
		Self {
			reduce_key: reduce_key.to_string(),
			bucket,
			source: None,
			etag: None,
			timestamp: None,
			size: 0,
			data: None,
		}
	}

	pub fn is_empty_aggregate(&self) -> bool {
		self.etag.is_none()
	}
}

/// A scheduled reduction row as observed by a pull, identifying the exact
/// row version that was consumed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduledItem {
	pub view: String,
	pub level: u8,
	pub reduce_key: String,
	pub bucket: i32,
	pub sequence: SequenceId,
	pub timestamp: Timestamp,
}

impl ScheduledItem {
	pub(crate) fn key(&self) -> ScheduledReductionKey {
		ScheduledReductionKey {
			view: self.view.clone(),
			level: self.level,
			reduce_key: self.reduce_key.clone(),
			bucket: self.bucket,
		}
	}
}

/// Watermark of completed scheduled work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReductionInfo {
	pub etag: SequenceId,
	pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReductionDebugInfo {
	pub key: String,
	pub level: u8,
	pub bucket: i32,
	pub etag: SequenceId,
	pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceKeyAndCount {
	pub key: String,
	pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceTypePerKey {
	pub reduce_key: String,
	pub reduce_type: ReduceType,
}

/// Rows removed by dropping a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewDeletion {
	pub mapped_results: usize,
	pub reduced_results: usize,
	pub scheduled_reductions: usize,
	pub reduce_key_stats: usize,
	pub reduce_types: usize,
}
