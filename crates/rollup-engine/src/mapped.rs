// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeMap, HashSet};

use rollup_core::{
	EncodableKey, EncodedKey, Error, Result, SequenceCategory, Timestamp,
	key::{MappedResultByDocumentKey, MappedResultKey},
};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::{
	MapReduceActions, MappedResultInfo, ReduceKeyAndBucket,
	row::{MappedRow, Row},
};

impl MapReduceActions<'_, '_> {
	/// Stores one map output. Mapping the same document again without
	/// deleting first keeps both rows.
	#[instrument(name = "engine::mapped::put", level = "debug", skip(self, data))]
	pub fn put_mapped_result(&mut self, view: &str, document_id: &str, reduce_key: &str, data: &Value) -> Result<()> {
		let payload = self.shared.codecs.encode_document(reduce_key, data)?;
		let key = MappedResultKey {
			view: view.to_string(),
			reduce_key: reduce_key.to_string(),
			bucket: self.bucket_of(document_id),
			document_id: document_id.to_string(),
			sequence: self.next_sequence(SequenceCategory::MappedResults),
		};
		let row = MappedRow {
			document_id: document_id.to_string(),
			timestamp: Timestamp::now(),
			payload,
		};
		trace!(bucket = key.bucket, sequence = %key.sequence, "put mapped result");

		self.write_row(&key.encode(), &row)?;
		self.txn.set(&key.by_document().encode(), Vec::new())
	}

	/// Removes every mapped result of a document and records the touched
	/// (bucket, reduce key) pairs in `removed`. Returns the exact number of
	/// rows removed per reduce key, negated.
	#[instrument(name = "engine::mapped::delete_for_document", level = "debug", skip(self, removed))]
	pub fn delete_mapped_results_for_document(
		&mut self,
		view: &str,
		document_id: &str,
		removed: &mut HashSet<ReduceKeyAndBucket>,
	) -> Result<BTreeMap<String, i32>> {
		let index_keys = self.scan_keys(MappedResultByDocumentKey::document_scan(view, document_id))?;
		let mut deltas = BTreeMap::new();

		for index_key in index_keys {
			let Some(entry) = MappedResultByDocumentKey::decode(&index_key) else {
				return Err(Error::KeyDecode("mapped result document index".to_string()));
			};
			self.txn.remove(&entry.primary().encode())?;
			self.txn.remove(&index_key)?;

			*deltas.entry(entry.reduce_key.clone()).or_insert(0) -= 1;
			removed.insert(ReduceKeyAndBucket::new(entry.bucket, entry.reduce_key));
		}

		Ok(deltas)
	}

	/// Removes every mapped result of a view and returns the negative
	/// per-reduce-key deltas for the statistics. Does not apply them.
	#[instrument(name = "engine::mapped::delete_for_view", level = "debug", skip(self))]
	pub fn delete_mapped_results_for_view(&mut self, view: &str) -> Result<BTreeMap<String, i32>> {
		let keys = self.scan_keys(MappedResultKey::view_scan(view))?;
		let mut deltas = BTreeMap::new();

		for key in &keys {
			let entry = decode_mapped(key)?;
			self.txn.remove(key)?;
			self.txn.remove(&entry.by_document().encode())?;
			*deltas.entry(entry.reduce_key).or_insert(0) -= 1;
		}

		debug!(removed = keys.len(), reduce_keys = deltas.len(), "deleted mapped results for view");
		Ok(deltas)
	}

	/// Distinct buckets holding mapped results for a reduce key, ascending.
	pub fn mapped_buckets(&self, view: &str, reduce_key: &str) -> Result<Vec<i32>> {
		let mut buckets: Vec<i32> = Vec::new();
		for entry in self.txn.range(MappedResultKey::reduce_key_scan(view, reduce_key)) {
			let (key, _) = entry?;
			let bucket = decode_mapped(&key)?.bucket;
			if buckets.last() != Some(&bucket) {
				buckets.push(bucket);
			}
		}
		Ok(buckets)
	}

	/// All mapped results of the given reduce keys, in key order.
	#[instrument(name = "engine::mapped::results", level = "trace", skip(self, reduce_keys))]
	pub fn mapped_results<'k>(
		&self,
		view: &str,
		reduce_keys: impl IntoIterator<Item = &'k str>,
		load_data: bool,
	) -> Result<Vec<MappedResultInfo>> {
		let mut results = Vec::new();
		for reduce_key in reduce_keys {
			for entry in self.txn.range(MappedResultKey::reduce_key_scan(view, reduce_key)) {
				let (key, value) = entry?;
				results.push(self.mapped_info(&decode_mapped(&key)?, &value, load_data)?);
			}
		}
		Ok(results)
	}

	/// Mapped rows of one bucket, or the empty-aggregate marker when there
	/// are none.
	pub(crate) fn mapped_results_for_bucket(
		&self,
		view: &str,
		reduce_key: &str,
		bucket: i32,
		load_data: bool,
	) -> Result<Vec<MappedResultInfo>> {
		let mut results = Vec::new();
		for entry in self.txn.range(MappedResultKey::bucket_scan(view, reduce_key, bucket)) {
			let (key, value) = entry?;
			results.push(self.mapped_info(&decode_mapped(&key)?, &value, load_data)?);
		}
		if results.is_empty() {
			results.push(MappedResultInfo::empty_aggregate(reduce_key, bucket));
		}
		Ok(results)
	}

	/// Distinct reduce keys of a view, paginated.
	pub fn keys_for_view_debug(&self, view: &str, start: usize, take: usize) -> Result<Vec<String>> {
		let mut keys: Vec<String> = Vec::new();
		for entry in self.txn.range(MappedResultKey::view_scan(view)) {
			let (key, _) = entry?;
			let reduce_key = decode_mapped(&key)?.reduce_key;
			if keys.last() != Some(&reduce_key) {
				keys.push(reduce_key);
			}
			if keys.len() > start.saturating_add(take) {
				break;
			}
		}
		Ok(keys.into_iter().skip(start).take(take).collect())
	}

	/// Mapped results of one reduce key with their data, paginated.
	pub fn mapped_results_debug(
		&self,
		view: &str,
		reduce_key: &str,
		start: usize,
		take: usize,
	) -> Result<Vec<MappedResultInfo>> {
		self.txn
			.range(MappedResultKey::reduce_key_scan(view, reduce_key))
			.skip(start)
			.take(take)
			.map(|entry| {
				let (key, value) = entry?;
				self.mapped_info(&decode_mapped(&key)?, &value, true)
			})
			.collect()
	}

	fn mapped_info(&self, key: &MappedResultKey, value: &[u8], load_data: bool) -> Result<MappedResultInfo> {
		let row = MappedRow::from_bytes(value)?;
		let data = if load_data {
			Some(self.shared.codecs.decode_document(&key.reduce_key, &row.payload)?)
		} else {
			None
		};
		Ok(MappedResultInfo {
			reduce_key: key.reduce_key.clone(),
			bucket: key.bucket,
			source: Some(row.document_id),
			etag: Some(key.sequence),
			timestamp: Some(row.timestamp),
			size: row.payload.len(),
			data,
		})
	}
}

fn decode_mapped(key: &EncodedKey) -> Result<MappedResultKey> {
	MappedResultKey::decode(key).ok_or_else(|| Error::KeyDecode("mapped result".to_string()))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::MapReduceEngine;

	#[test]
	fn test_put_then_read_back() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				actions.put_mapped_result("orders", "orders/1", "customers/1", &json!({"total": 10}))?;
				let results = actions.mapped_results("orders", ["customers/1"], true)?;
				assert_eq!(results.len(), 1);
				assert_eq!(results[0].source.as_deref(), Some("orders/1"));
				assert_eq!(results[0].bucket, actions.bucket_of("orders/1"));
				assert_eq!(results[0].data, Some(json!({"total": 10})));
				assert!(results[0].size > 0);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_load_data_false_skips_decoding() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				actions.put_mapped_result("orders", "orders/1", "k", &json!(1))?;
				let results = actions.mapped_results("orders", ["k"], false)?;
				assert_eq!(results[0].data, None);
				assert!(results[0].etag.is_some());
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_delete_for_document_reports_touched_buckets() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				actions.put_mapped_result("v", "docs/1", "a", &json!({}))?;
				actions.put_mapped_result("v", "docs/1", "b", &json!({}))?;
				actions.put_mapped_result("v", "docs/1", "b", &json!({}))?;
				actions.put_mapped_result("v", "docs/2", "a", &json!({}))?;

				let mut removed = HashSet::new();
				let deltas = actions.delete_mapped_results_for_document("v", "Docs/1", &mut removed)?;

				let bucket = actions.bucket_of("docs/1");
				assert_eq!(removed.len(), 2);
				assert!(removed.contains(&ReduceKeyAndBucket::new(bucket, "a")));
				assert!(removed.contains(&ReduceKeyAndBucket::new(bucket, "b")));
				assert_eq!(deltas.get("a"), Some(&-1));
				assert_eq!(deltas.get("b"), Some(&-2));

				let left = actions.mapped_results("v", ["a", "b"], false)?;
				assert_eq!(left.len(), 1);
				assert_eq!(left[0].source.as_deref(), Some("docs/2"));
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_mapped_buckets_are_distinct() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				for i in 0..20 {
					actions.put_mapped_result("v", &format!("docs/{i}"), "k", &json!(i))?;
				}
				actions.put_mapped_result("v", "docs/0", "k", &json!(0))?;

				let buckets = actions.mapped_buckets("v", "k")?;
				let mut expected: Vec<i32> = (0..20).map(|i| actions.bucket_of(&format!("docs/{i}"))).collect();
				expected.sort();
				expected.dedup();
				assert_eq!(buckets, expected);
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_empty_bucket_yields_marker() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				let results = actions.mapped_results_for_bucket("v", "k", 7, true)?;
				assert_eq!(results, vec![MappedResultInfo::empty_aggregate("k", 7)]);
				assert!(results[0].is_empty_aggregate());
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_keys_for_view_debug_paginates() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				for key in ["a", "b", "c", "d"] {
					actions.put_mapped_result("v", "docs/1", key, &json!({}))?;
					actions.put_mapped_result("v", "docs/2", key, &json!({}))?;
				}
				assert_eq!(actions.keys_for_view_debug("v", 0, 10)?, vec!["a", "b", "c", "d"]);
				assert_eq!(actions.keys_for_view_debug("v", 1, 2)?, vec!["b", "c"]);
				assert!(actions.keys_for_view_debug("v", 4, 2)?.is_empty());
				Ok(())
			})
			.unwrap();
	}

	#[test]
	fn test_view_names_are_case_insensitive() {
		let engine = MapReduceEngine::memory().unwrap();
		engine
			.batch(|actions| {
				actions.put_mapped_result("Orders", "orders/1", "k", &json!({}))?;
				assert_eq!(actions.mapped_results_debug("orders", "k", 0, 10)?.len(), 1);
				assert!(actions.mapped_results_debug("orders", "K", 0, 10)?.is_empty());
				Ok(())
			})
			.unwrap();
	}
}
