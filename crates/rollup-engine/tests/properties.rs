// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use rollup_engine::{EngineConfig, MapReduceEngine, ReduceCursor, ReduceKeyAndBucket, ReduceType};
use rollup_store::{Storage, StoreBackend};
use rollup_testing::{memory_engine, sqlite_engine};
use serde_json::json;

#[test]
fn test_bucket_assignment_is_deterministic() {
	let first = memory_engine();
	let second = MapReduceEngine::new(EngineConfig::memory()).unwrap();

	for id in ["users/1", "users/2", "orders/1337", ""] {
		assert_eq!(first.bucket_of(id), first.bucket_of(id));
		assert_eq!(first.bucket_of(id), second.bucket_of(id));
		assert!((0..first.buckets().count() as i32).contains(&first.bucket_of(id)));
	}
	assert_eq!(first.bucket_of("Users/1"), first.bucket_of("users/1"));
}

#[test]
fn test_operations_stay_within_their_view() {
	for engine in [memory_engine(), sqlite_engine()] {
		engine
			.batch(|actions| {
				for view in ["v", "w"] {
					actions.put_mapped_result(view, "docs/1", "k", &json!(view))?;
					actions.put_reduced_result(view, "k", 1, 0, 0, &json!(view))?;
					actions.schedule_reductions(view, 0, &ReduceKeyAndBucket::new(0, "k"))?;
					actions.increment_reduce_key_counter(view, "k", 1)?;
				}

				let mut removed = HashSet::new();
				actions.delete_mapped_results_for_document("v", "docs/1", &mut removed)?;
				actions.remove_reduce_results("v", 1, "k", 0)?;
				actions.delete_scheduled_reductions_for_key("v", 0, "k")?;
				actions.increment_reduce_key_counter("v", "k", -1)?;

				assert_eq!(actions.mapped_results_debug("w", "k", 0, 10)?[0].data, Some(json!("w")));
				assert_eq!(actions.reduced_results_debug("w", "k", 1, 0, 10)?[0].data, Some(json!("w")));
				assert_eq!(actions.scheduled_reductions_debug("w", 0, 10)?.len(), 1);
				assert_eq!(actions.mapped_items_count("w", "k")?, 1);

				assert!(actions.mapped_results_debug("v", "k", 0, 10)?.is_empty());
				assert!(actions.reduced_results_debug("v", "k", 1, 0, 10)?.is_empty());
				assert!(actions.scheduled_reductions_debug("v", 0, 10)?.is_empty());
				assert!(actions.keys_stats("v", 0, 10)?.is_empty());
				Ok(())
			})
			.unwrap();
	}
}

#[test]
fn test_view_prefix_does_not_leak() {
	let engine = memory_engine();
	engine
		.batch(|actions| {
			actions.put_mapped_result("orders", "docs/1", "k", &json!(1))?;
			actions.put_mapped_result("orders2", "docs/1", "k", &json!(2))?;
			actions.delete_view("orders")?;
			assert_eq!(actions.mapped_results_debug("orders2", "k", 0, 10)?.len(), 1);
			Ok(())
		})
		.unwrap();
}

#[test]
fn test_counts_never_persist_at_or_below_zero() {
	let engine = memory_engine();
	let deltas = [3, -1, -1, 5, -10, 2, -2, -4, 1];

	engine
		.batch(|actions| {
			let mut expected = 0;
			for delta in deltas {
				actions.increment_reduce_key_counter("v", "k", delta)?;
				expected = (expected + delta).max(0);

				let stats = actions.keys_stats("v", 0, 10)?;
				assert!(stats.iter().all(|s| s.count > 0));
				assert_eq!(actions.mapped_items_count("v", "k")?, expected);
			}
			Ok(())
		})
		.unwrap();
}

#[test]
fn test_increment_then_decrement_removes_stat() {
	let engine = sqlite_engine();
	engine.batch(|actions| actions.increment_reduce_key_counter("v", "k", 5)).unwrap();
	engine.batch(|actions| actions.increment_reduce_key_counter("v", "k", -5)).unwrap();
	assert!(engine.batch(|actions| actions.keys_stats("v", 0, 10)).unwrap().is_empty());
}

#[test]
fn test_strategy_follows_limit() {
	let engine = memory_engine();
	engine
		.batch(|actions| {
			actions.increment_reduce_key_counter("v", "k", 150)?;
			assert_eq!(actions.decide_strategy("v", ["k"], 100)?[0].reduce_type, ReduceType::MultiStep);

			actions.increment_reduce_key_counter("v", "k", -100)?;
			assert_eq!(actions.decide_strategy("v", ["k"], 100)?[0].reduce_type, ReduceType::SingleStep);
			Ok(())
		})
		.unwrap();
}

#[test]
fn test_pull_never_repeats_a_bucket_within_one_call() {
	let engine = memory_engine();
	engine
		.batch(|actions| {
			for bucket in [4, 1, 4, 2, 1, 4] {
				actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(bucket, "k"))?;
				actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(bucket, "j"))?;
			}

			let mut cursor = ReduceCursor::new("v", 0, ["j", "k"], 1000);
			let results = actions.get_items_to_reduce(&mut cursor)?;

			let pairs: HashSet<(String, i32)> = results
				.iter()
				.filter(|r| r.is_empty_aggregate())
				.map(|r| (r.reduce_key.clone(), r.bucket))
				.collect();
			let markers = results.iter().filter(|r| r.is_empty_aggregate()).count();
			assert_eq!(pairs.len(), markers);
			assert_eq!(markers, 6);
			Ok(())
		})
		.unwrap();
}

#[test]
fn test_repeated_pulls_surface_every_row_once() {
	let engine = memory_engine();
	engine
		.batch(|actions| {
			let keys = ["a", "b", "c"];
			for key in keys {
				for bucket in 0..5 {
					actions.schedule_reductions("v", 1, &ReduceKeyAndBucket::new(bucket, key))?;
				}
			}

			let mut cursor = ReduceCursor::new("v", 1, keys, 0);
			let mut surfaced = Vec::new();
			while !cursor.is_drained() {
				cursor.take = 4;
				let results = actions.get_items_to_reduce(&mut cursor)?;
				surfaced.extend(results.into_iter().map(|r| (r.reduce_key, r.bucket)));
			}

			let distinct: HashSet<_> = surfaced.iter().cloned().collect();
			assert_eq!(surfaced.len(), 15);
			assert_eq!(distinct.len(), 15);
			assert_eq!(cursor.items_to_delete.len(), 15);

			let watermark = actions.delete_scheduled_reductions(&cursor.items_to_delete)?;
			assert!(watermark.is_some());
			assert!(actions.scheduled_reductions_debug("v", 0, 100)?.is_empty());
			Ok(())
		})
		.unwrap();
}

#[test]
fn test_empty_bucket_yields_exactly_one_marker() {
	for engine in [memory_engine(), sqlite_engine()] {
		engine
			.batch(|actions| {
				for level in 0..=2 {
					let results = actions.results_for_bucket("v", level, "k", 42, true)?;
					assert_eq!(results.len(), 1);
					assert!(results[0].is_empty_aggregate());
					assert_eq!(results[0].data, None);
					assert_eq!(results[0].bucket, 42);
					assert_eq!(results[0].reduce_key, "k");
				}
				Ok(())
			})
			.unwrap();
	}
}

#[test]
fn test_consumed_work_frees_memory_storage() {
	let engine = memory_engine();
	for round in 0..2000 {
		engine
			.batch(|actions| {
				actions.schedule_reductions("v", 0, &ReduceKeyAndBucket::new(round % 7, "k"))?;
				let mut cursor = ReduceCursor::new("v", 0, ["k"], 10);
				actions.get_items_to_reduce(&mut cursor)?;
				actions.delete_scheduled_reductions(&cursor.items_to_delete)
			})
			.unwrap();
	}

	let Storage::Memory(memory) = engine.storage().store() else {
		panic!("expected memory backend");
	};
	assert_eq!(memory.physical_len(), 0);
	assert_eq!(engine.storage().store().len().unwrap(), 0);
}
