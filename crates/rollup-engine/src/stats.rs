// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rollup_core::{
	EncodableKey, EncodedKey, Error, Result,
	key::{ReduceKeyStatKey, ReduceTypeKey, ScheduledReductionKey},
};
use tracing::{debug, instrument, trace};

use crate::{
	MapReduceActions, ReduceKeyAndBucket, ReduceKeyAndCount, ReduceType, ReduceTypePerKey,
	row::{ReduceTypeRow, Row, StatRow},
};

impl MapReduceActions<'_, '_> {
	/// Adds `delta` to the live mapped item count of a reduce key. A count
	/// that would drop to zero or below removes the stat row instead.
	#[instrument(name = "engine::stats::increment", level = "trace", skip(self))]
	pub fn increment_reduce_key_counter(&mut self, view: &str, reduce_key: &str, delta: i32) -> Result<()> {
		let key = ReduceKeyStatKey::encoded(view, reduce_key);
		match self.read_row::<StatRow>(&key)? {
			None if delta <= 0 => Ok(()),
			None => self.write_row(
				&key,
				&StatRow {
					mapped_items_count: delta,
				},
			),
			Some(mut row) => {
				row.mapped_items_count = row.mapped_items_count.saturating_add(delta);
				if row.mapped_items_count > 0 {
					self.write_row(&key, &row)
				} else {
					trace!("reduce key stat dropped to zero");
					self.txn.remove(&key)
				}
			}
		}
	}

	/// Applies per-reduce-key deltas, such as the ones returned by
	/// [`Self::delete_mapped_results_for_document`].
	pub fn apply_reduce_key_deltas(&mut self, view: &str, deltas: &BTreeMap<String, i32>) -> Result<()> {
		for (reduce_key, delta) in deltas {
			self.increment_reduce_key_counter(view, reduce_key, *delta)?;
		}
		Ok(())
	}

	/// Decrements the count once per removed (bucket, reduce key) pair.
	pub fn update_removed_map_reduce_stats(&mut self, view: &str, removed: &HashSet<ReduceKeyAndBucket>) -> Result<()> {
		for item in removed {
			self.increment_reduce_key_counter(view, &item.reduce_key, -1)?;
		}
		Ok(())
	}

	/// Picks the reduction strategy per key: single step unless the key holds
	/// at least `limit` mapped items.
	#[instrument(name = "engine::stats::decide_strategy", level = "debug", skip(self, reduce_keys))]
	pub fn decide_strategy<'k>(
		&self,
		view: &str,
		reduce_keys: impl IntoIterator<Item = &'k str>,
		limit: usize,
	) -> Result<Vec<ReduceTypePerKey>> {
		reduce_keys
			.into_iter()
			.map(|reduce_key| {
				let count = self.mapped_items_count(view, reduce_key)?;
				let reduce_type = if count as usize >= limit {
					ReduceType::MultiStep
				} else {
					ReduceType::SingleStep
				};
				Ok(ReduceTypePerKey {
					reduce_key: reduce_key.to_string(),
					reduce_type,
				})
			})
			.collect()
	}

	/// Strategy for the distinct reduce keys among the first `take`
	/// scheduled rows of a view, across all levels.
	pub fn reduce_types_for_scheduled(&self, view: &str, take: usize, limit: usize) -> Result<Vec<ReduceTypePerKey>> {
		let mut keys = BTreeSet::new();
		for item in self.scheduled_items(ScheduledReductionKey::view_scan(view)).take(take) {
			keys.insert(item?.reduce_key);
		}
		self.decide_strategy(view, keys.iter().map(String::as_str), limit)
	}

	/// Records the strategy the driver used for a reduce key. The record is
	/// independent of the mapped item count and survives the key dropping to
	/// zero items.
	#[instrument(name = "engine::stats::record_reduce_type", level = "trace", skip(self))]
	pub fn update_performed_reduce_type(&mut self, view: &str, reduce_key: &str, reduce_type: ReduceType) -> Result<()> {
		self.write_row(
			&ReduceTypeKey::encoded(view, reduce_key),
			&ReduceTypeRow {
				reduce_type,
			},
		)
	}

	/// `ReduceType::None` for a key that was never reduced.
	pub fn last_performed_reduce_type(&self, view: &str, reduce_key: &str) -> Result<ReduceType> {
		Ok(self
			.read_row::<ReduceTypeRow>(&ReduceTypeKey::encoded(view, reduce_key))?
			.map(|row| row.reduce_type)
			.unwrap_or_default())
	}

	pub fn mapped_items_count(&self, view: &str, reduce_key: &str) -> Result<i32> {
		Ok(self
			.read_row::<StatRow>(&ReduceKeyStatKey::encoded(view, reduce_key))?
			.map(|row| row.mapped_items_count)
			.unwrap_or(0))
	}

	/// Reduce keys of a view with their live mapped item counts, paginated.
	pub fn keys_stats(&self, view: &str, start: usize, take: usize) -> Result<Vec<ReduceKeyAndCount>> {
		self.txn
			.range(ReduceKeyStatKey::view_scan(view))
			.skip(start)
			.take(take)
			.map(|entry| {
				let (key, value) = entry?;
				let row = StatRow::from_bytes(&value)?;
				Ok(ReduceKeyAndCount {
					key: decode_stat(&key)?.reduce_key,
					count: row.mapped_items_count,
				})
			})
			.collect()
	}

	pub(crate) fn delete_stats_for_view(&mut self, view: &str) -> Result<usize> {
		let keys = self.scan_keys(ReduceKeyStatKey::view_scan(view))?;
		for key in &keys {
			self.txn.remove(key)?;
		}
		debug!(removed = keys.len(), "deleted reduce key stats for view");
		Ok(keys.len())
	}

	pub(crate) fn delete_reduce_types_for_view(&mut self, view: &str) -> Result<usize> {
		let keys = self.scan_keys(ReduceTypeKey::view_scan(view))?;
		for key in &keys {
			self.txn.remove(key)?;
		}
		Ok(keys.len())
	}
}

fn decode_stat(key: &EncodedKey) -> Result<ReduceKeyStatKey> {
	ReduceKeyStatKey::decode(key).ok_or_else(|| Error::KeyDecode("reduce key stat".to_string()))
}
