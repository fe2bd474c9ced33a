// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_core::{
	EncodableKey, EncodedKey, Error, Result, SequenceCategory, Timestamp,
	key::{ReducedResultBySourceKey, ReducedResultKey},
};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::{
	MapReduceActions, MappedResultInfo,
	row::{ReducedRow, Row},
};

fn check_reduced_level(level: u8) -> Result<()> {
	match level {
		1 | 2 => Ok(()),
		_ => Err(Error::InvalidLevel {
			level,
		}),
	}
}

impl MapReduceActions<'_, '_> {
	#[instrument(name = "engine::reduced::put", level = "debug", skip(self, data))]
	pub fn put_reduced_result(
		&mut self,
		view: &str,
		reduce_key: &str,
		level: u8,
		source_bucket: i32,
		bucket: i32,
		data: &Value,
	) -> Result<()> {
		check_reduced_level(level)?;
		let payload = self.shared.codecs.encode_document(reduce_key, data)?;
		let key = ReducedResultKey {
			view: view.to_string(),
			reduce_key: reduce_key.to_string(),
			level,
			bucket,
			source_bucket,
			sequence: self.next_sequence(SequenceCategory::ReduceResults),
		};
		let row = ReducedRow {
			timestamp: Timestamp::now(),
			payload,
		};
		trace!(sequence = %key.sequence, "put reduced result");

		self.write_row(&key.encode(), &row)?;
		self.txn.set(&key.by_source().encode(), Vec::new())
	}

	/// Invalidates every result at `level` aggregated from `source_bucket`.
	#[instrument(name = "engine::reduced::remove_by_source", level = "debug", skip(self))]
	pub fn remove_reduce_results(&mut self, view: &str, level: u8, reduce_key: &str, source_bucket: i32) -> Result<()> {
		let index_keys = self.scan_keys(ReducedResultBySourceKey::source_scan(view, reduce_key, level, source_bucket))?;
		for index_key in &index_keys {
			let entry = ReducedResultBySourceKey::decode(index_key)
				.ok_or_else(|| Error::KeyDecode("reduced result source index".to_string()))?;
			self.txn.remove(&entry.primary().encode())?;
			self.txn.remove(index_key)?;
		}
		trace!(removed = index_keys.len(), "removed reduce results");
		Ok(())
	}

	/// Reduced rows of one bucket, or the empty-aggregate marker when there
	/// are none.
	pub fn reduced_results_for_bucket(
		&self,
		view: &str,
		reduce_key: &str,
		level: u8,
		bucket: i32,
		load_data: bool,
	) -> Result<Vec<MappedResultInfo>> {
		check_reduced_level(level)?;
		let mut results = Vec::new();
		for entry in self.txn.range(ReducedResultKey::bucket_scan(view, reduce_key, level, bucket)) {
			let (key, value) = entry?;
			results.push(self.reduced_info(&decode_reduced(&key)?, &value, load_data)?);
		}
		if results.is_empty() {
			results.push(MappedResultInfo::empty_aggregate(reduce_key, bucket));
		}
		Ok(results)
	}

	/// Rows for a bucket at any level: mapped rows at level 0, reduced rows
	/// at levels 1 and 2.
	pub fn results_for_bucket(
		&self,
		view: &str,
		level: u8,
		reduce_key: &str,
		bucket: i32,
		load_data: bool,
	) -> Result<Vec<MappedResultInfo>> {
		match level {
			0 => self.mapped_results_for_bucket(view, reduce_key, bucket, load_data),
			1 | 2 => self.reduced_results_for_bucket(view, reduce_key, level, bucket, load_data),
			_ => Err(Error::InvalidLevel {
				level,
			}),
		}
	}

	pub fn reduced_results_debug(
		&self,
		view: &str,
		reduce_key: &str,
		level: u8,
		start: usize,
		take: usize,
	) -> Result<Vec<MappedResultInfo>> {
		self.txn
			.range(ReducedResultKey::level_scan(view, reduce_key, level))
			.skip(start)
			.take(take)
			.map(|entry| {
				let (key, value) = entry?;
				self.reduced_info(&decode_reduced(&key)?, &value, true)
			})
			.collect()
	}

	pub(crate) fn delete_reduced_results_for_view(&mut self, view: &str) -> Result<usize> {
		let keys = self.scan_keys(ReducedResultKey::view_scan(view))?;
		for key in &keys {
			let entry = decode_reduced(key)?;
			self.txn.remove(key)?;
			self.txn.remove(&entry.by_source().encode())?;
		}
		debug!(removed = keys.len(), "deleted reduced results for view");
		Ok(keys.len())
	}

	fn reduced_info(&self, key: &ReducedResultKey, value: &[u8], load_data: bool) -> Result<MappedResultInfo> {
		let row = ReducedRow::from_bytes(value)?;
		let data = match load_data {
			true => Some(self.shared.codecs.decode_document(&key.reduce_key, &row.payload)?),
			false => None,
		};
		Ok(MappedResultInfo {
			reduce_key: key.reduce_key.clone(),
			bucket: key.bucket,
			source: Some(key.source_bucket.to_string()),
			etag: Some(key.sequence),
			timestamp: Some(row.timestamp),
			size: row.payload.len(),
			data,
		})
	}
}

fn decode_reduced(key: &EncodedKey) -> Result<ReducedResultKey> {
	ReducedResultKey::decode(key).ok_or_else(|| Error::KeyDecode("reduced result".to_string()))
}
