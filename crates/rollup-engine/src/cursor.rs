// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeSet, HashSet};

use rollup_core::{Result, key::ScheduledReductionKey};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::{MapReduceActions, MappedResultInfo, ReduceKeyAndBucket, ScheduledItem};

/// Caller-owned state of a reduction pass, carried across
/// [`MapReduceActions::get_items_to_reduce`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceCursor {
	pub view: String,
	pub level: u8,
	/// Reduce keys still to visit. A key leaves the list once all of its
	/// scheduled rows have been visited.
	pub reduce_keys: Vec<String>,
	/// Remaining capacity, decremented once per emitted record.
	pub take: usize,
	pub load_data: bool,
	/// (reduce key, bucket) pairs emitted by earlier calls.
	pub already_seen: BTreeSet<ReduceKeyAndBucket>,
	/// Scheduled rows consumed so far, to be passed to
	/// [`MapReduceActions::delete_scheduled_reductions`] once the reduce succeeded.
	pub items_to_delete: BTreeSet<ScheduledItem>,
}

impl ReduceCursor {
	pub fn new<I, S>(view: impl Into<String>, level: u8, reduce_keys: I, take: usize) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			view: view.into(),
			level,
			reduce_keys: reduce_keys.into_iter().map(Into::into).collect(),
			take,
			load_data: true,
			already_seen: BTreeSet::new(),
			items_to_delete: BTreeSet::new(),
		}
	}

	pub fn with_load_data(mut self, load_data: bool) -> Self {
		self.load_data = load_data;
		self
	}

	/// Refills the capacity for the next call.
	pub fn with_take(mut self, take: usize) -> Self {
		self.take = take;
		self
	}

	pub fn is_drained(&self) -> bool {
		self.reduce_keys.is_empty()
	}
}

impl MapReduceActions<'_, '_> {
	/// Pulls the data behind scheduled work items, reduce key by reduce key
	/// in storage order, until the cursor's capacity runs out.
	///
	/// Within one call each (reduce key, bucket) pair is emitted at most once.
	/// A pair is emitted again in a later call only when a new scheduled row
	/// shows up for it. Consumed rows are collected in
	/// `cursor.items_to_delete` but not removed.
	#[instrument(name = "engine::cursor::get_items_to_reduce", level = "debug", skip(self, cursor), fields(
		view = %cursor.view,
		level = cursor.level,
		keys = cursor.reduce_keys.len(),
		take = cursor.take,
		emitted = tracing::field::Empty
	))]
	pub fn get_items_to_reduce(&self, cursor: &mut ReduceCursor) -> Result<Vec<MappedResultInfo>> {
		let mut seen_locally: HashSet<ReduceKeyAndBucket> = HashSet::new();
		let mut results = Vec::new();

		for reduce_key in cursor.reduce_keys.clone() {
			let range = ScheduledReductionKey::reduce_key_scan(&cursor.view, cursor.level, &reduce_key);
			let mut rows = self.scheduled_items(range).peekable();
			let mut drained = true;

			while let Some(item) = rows.next() {
				let item = item?;
				let pair = ReduceKeyAndBucket::new(item.bucket, item.reduce_key.clone());

				let is_new_row = !cursor.items_to_delete.contains(&item);
				let never_seen = cursor.already_seen.insert(pair.clone());

				if (is_new_row || never_seen) && seen_locally.insert(pair) {
					let emitted = self.results_for_bucket(
						&cursor.view,
						cursor.level,
						&item.reduce_key,
						item.bucket,
						cursor.load_data,
					)?;
					cursor.take = cursor.take.saturating_sub(emitted.len());
					trace!(bucket = item.bucket, records = emitted.len(), "emitted bucket");
					results.extend(emitted);
				}

				if is_new_row {
					cursor.items_to_delete.insert(item);
				}

				if cursor.take == 0 {
					drained = rows.peek().is_none();
					break;
				}
			}

			if drained {
				cursor.reduce_keys.retain(|k| k != &reduce_key);
			}
			if cursor.take == 0 {
				break;
			}
		}

		tracing::Span::current().record("emitted", results.len());
		Ok(results)
	}
}
