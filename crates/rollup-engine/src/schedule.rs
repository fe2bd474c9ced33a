// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_core::{
	EncodableKey, EncodedKey, EncodedKeyRange, Error, Result, SequenceCategory, Timestamp,
	key::ScheduledReductionKey,
};
use tracing::{debug, instrument, trace};

use crate::{
	MapReduceActions, ReduceKeyAndBucket, ScheduledItem, ScheduledReductionDebugInfo, ScheduledReductionInfo,
	row::{Row, ScheduledRow},
};

impl MapReduceActions<'_, '_> {
	/// Marks a bucket as needing re-aggregation at `level`. Scheduling the
	/// same work item again replaces the row with a fresh sequence id.
	#[instrument(name = "engine::schedule::put", level = "debug", skip(self, item), fields(
		reduce_key = %item.reduce_key,
		bucket = item.bucket
	))]
	pub fn schedule_reductions(&mut self, view: &str, level: u8, item: &ReduceKeyAndBucket) -> Result<()> {
		if level > 2 {
			return Err(Error::InvalidLevel {
				level,
			});
		}
		let key = ScheduledReductionKey {
			view: view.to_string(),
			level,
			reduce_key: item.reduce_key.clone(),
			bucket: item.bucket,
		};
		let row = ScheduledRow {
			sequence: self.next_sequence(SequenceCategory::ScheduledReductions),
			timestamp: Timestamp::now(),
		};
		self.write_row(&key.encode(), &row)
	}

	/// Physically removes consumed work items and returns the highest
	/// sequence id among the removed rows, or `None` when nothing was removed.
	///
	/// A row rescheduled after it was pulled carries a newer sequence id and
	/// is kept.
	#[instrument(name = "engine::schedule::delete_consumed", level = "debug", skip(self, items))]
	pub fn delete_scheduled_reductions<'i>(
		&mut self,
		items: impl IntoIterator<Item = &'i ScheduledItem>,
	) -> Result<Option<ScheduledReductionInfo>> {
		let mut watermark: Option<ScheduledReductionInfo> = None;
		let mut removed = 0usize;

		for item in items {
			let key = item.key().encode();
			let Some(row) = self.read_row::<ScheduledRow>(&key)? else {
				continue;
			};
			if row.sequence != item.sequence {
				trace!(reduce_key = %item.reduce_key, bucket = item.bucket, "keeping rescheduled reduction");
				continue;
			}

			if watermark.is_none_or(|w| row.sequence > w.etag) {
				watermark = Some(ScheduledReductionInfo {
					etag: row.sequence,
					timestamp: row.timestamp,
				});
			}
			self.txn.remove(&key)?;
			removed += 1;
		}

		debug!(removed, "deleted scheduled reductions");
		Ok(watermark)
	}

	/// Removes all scheduled work of one reduce key at one level.
	#[instrument(name = "engine::schedule::delete_for_key", level = "debug", skip(self))]
	pub fn delete_scheduled_reductions_for_key(&mut self, view: &str, level: u8, reduce_key: &str) -> Result<()> {
		let keys = self.scan_keys(ScheduledReductionKey::reduce_key_scan(view, level, reduce_key))?;
		for key in &keys {
			self.txn.remove(key)?;
		}
		Ok(())
	}

	pub fn scheduled_reductions_debug(
		&self,
		view: &str,
		start: usize,
		take: usize,
	) -> Result<Vec<ScheduledReductionDebugInfo>> {
		self.txn
			.range(ScheduledReductionKey::view_scan(view))
			.skip(start)
			.take(take)
			.map(|entry| {
				let (key, value) = entry?;
				let key = decode_scheduled(&key)?;
				let row = ScheduledRow::from_bytes(&value)?;
				Ok(ScheduledReductionDebugInfo {
					key: key.reduce_key,
					level: key.level,
					bucket: key.bucket,
					etag: row.sequence,
					timestamp: row.timestamp,
				})
			})
			.collect()
	}

	/// Scheduled rows of a range, decoded into consumable items.
	pub(crate) fn scheduled_items(&self, range: EncodedKeyRange) -> impl Iterator<Item = Result<ScheduledItem>> + '_ {
		self.txn.range(range).map(|entry| {
			let (key, value) = entry?;
			let key = decode_scheduled(&key)?;
			let row = ScheduledRow::from_bytes(&value)?;
			Ok(ScheduledItem {
				view: key.view,
				level: key.level,
				reduce_key: key.reduce_key,
				bucket: key.bucket,
				sequence: row.sequence,
				timestamp: row.timestamp,
			})
		})
	}

	pub(crate) fn delete_scheduled_for_view(&mut self, view: &str) -> Result<usize> {
		let keys = self.scan_keys(ScheduledReductionKey::view_scan(view))?;
		for key in &keys {
			self.txn.remove(key)?;
		}
		Ok(keys.len())
	}
}

fn decode_scheduled(key: &EncodedKey) -> Result<ScheduledReductionKey> {
	ScheduledReductionKey::decode(key).ok_or_else(|| Error::KeyDecode("scheduled reduction".to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::MapReduceEngine;

	#[test]
	fn test_schedule_is_idempotent_per_work_item() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				let item = ReduceKeyAndBucket::new(3, "k");
				actions.schedule_reductions("v", 0, &item)?;
				let first = actions.scheduled_reductions_debug("v", 0, 10)?;
				actions.schedule_reductions("v", 0, &item)?;
				let second = actions.scheduled_reductions_debug("v", 0, 10)?;

				assert_eq!(first.len(), 1);
				assert_eq!(second.len(), 1);
				assert!(second[0].etag > first[0].etag);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_delete_consumed_returns_watermark() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				for bucket in [5, 1, 3] {
					actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(bucket, "k"))?;
				}
				let items: Vec<ScheduledItem> =
					actions.scheduled_items(ScheduledReductionKey::view_scan("v")).collect::<Result<_>>()?;
				assert_eq!(items.len(), 3);
				let newest = items.iter().map(|i| i.sequence).max().unwrap();

				let watermark = actions.delete_scheduled_reductions(&items)?.unwrap();
				assert_eq!(watermark.etag, newest);
				assert!(actions.scheduled_reductions_debug("v", 0, 10)?.is_empty());

				assert_eq!(actions.delete_scheduled_reductions(&items)?, None);
				assert_eq!(actions.delete_scheduled_reductions(&Vec::<ScheduledItem>::new())?, None);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_delete_consumed_keeps_rescheduled_rows() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				let item = ReduceKeyAndBucket::new(1, "k");
				actions.schedule_reductions("v", 0, &item)?;
				let consumed: Vec<ScheduledItem> =
					actions.scheduled_items(ScheduledReductionKey::view_scan("v")).collect::<Result<_>>()?;

				actions.schedule_reductions("v", 0, &item)?;
				assert_eq!(actions.delete_scheduled_reductions(&consumed)?, None);
				assert_eq!(actions.scheduled_reductions_debug("v", 0, 10)?.len(), 1);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_delete_for_key_is_exact() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(1, "a"))?;
				actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(2, "a"))?;
				actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(1, "ab"))?;
				actions.schedule_reductions("v", 1, &ReduceKeyAndBucket::new(1, "a"))?;

				actions.delete_scheduled_reductions_for_key("v", 0, "a")?;

				let left = actions.scheduled_reductions_debug("v", 0, 10)?;
				assert_eq!(left.len(), 2);
				assert_eq!((left[0].level, left[0].key.as_str()), (0, "ab"));
				assert_eq!((left[1].level, left[1].key.as_str()), (1, "a"));
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_invalid_schedule_level() {
		let engine = MapReduceEngine::memory().unwrap();
		let result = engine.batch(|actions| actions.schedule_reductions("v", 3, &ReduceKeyAndBucket::new(0, "k")));
		assert_eq!(
			result,
			Err(Error::InvalidLevel {
				level: 3
			})
		);
	}
}
