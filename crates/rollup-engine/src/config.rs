// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use rollup_core::{CodecChain, DocumentCodec, Result, SequenceGenerator};
use rollup_store::SqliteConfig;
use rollup_transaction::{StorageConfig, TransactionalStorage};
use tracing::debug;

use crate::{
	BucketAssignment, MapReduceEngine,
	bucket::{DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_FAN_IN},
	engine::EngineShared,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
	pub storage: StorageConfig,
	/// Reduce keys with at least this many mapped items are reduced in
	/// multiple steps.
	pub limit_of_items_to_reduce_in_single_step: usize,
	/// Number of level-0 buckets.
	pub bucket_count: u32,
	/// Buckets of one level folded into a single bucket of the next.
	pub bucket_fan_in: u32,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			storage: StorageConfig::default(),
			limit_of_items_to_reduce_in_single_step: 1024,
			bucket_count: DEFAULT_BUCKET_COUNT,
			bucket_fan_in: DEFAULT_BUCKET_FAN_IN,
		}
	}
}

impl EngineConfig {
	pub fn memory() -> Self {
		Self::default()
	}

	pub fn sqlite(config: SqliteConfig) -> Self {
		Self {
			storage: StorageConfig::sqlite(config),
			..Default::default()
		}
	}

	pub fn with_storage(mut self, storage: StorageConfig) -> Self {
		self.storage = storage;
		self
	}

	pub fn with_single_step_limit(mut self, limit: usize) -> Self {
		self.limit_of_items_to_reduce_in_single_step = limit;
		self
	}

	pub fn with_buckets(mut self, count: u32, fan_in: u32) -> Self {
		self.bucket_count = count;
		self.bucket_fan_in = fan_in;
		self
	}
}

/// Assembles a [`MapReduceEngine`]. Codecs apply in registration order.
pub struct EngineBuilder {
	config: EngineConfig,
	codecs: CodecChain,
	sequence_epoch: Option<u64>,
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new(EngineConfig::default())
	}
}

impl EngineBuilder {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			config,
			codecs: CodecChain::new(),
			sequence_epoch: None,
		}
	}

	pub fn codec(mut self, codec: impl DocumentCodec + 'static) -> Self {
		self.codecs = self.codecs.with(codec);
		self
	}

	pub fn shared_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
		self.codecs.push(codec);
		self
	}

	/// Fixes the generator epoch, for reproducible sequence ids in tests.
	pub fn sequence_epoch(mut self, epoch: u64) -> Self {
		self.sequence_epoch = Some(epoch);
		self
	}

	pub fn build(self) -> Result<MapReduceEngine> {
		let storage = TransactionalStorage::new(self.config.storage.clone())?;
		let sequences = match self.sequence_epoch {
			Some(epoch) => SequenceGenerator::with_epoch(epoch),
			None => SequenceGenerator::new(),
		};
		let buckets = BucketAssignment::new(self.config.bucket_count, self.config.bucket_fan_in);

		debug!(
			codecs = ?self.codecs,
			bucket_count = buckets.count(),
			fan_in = buckets.fan_in(),
			epoch = sequences.epoch(),
			"building map-reduce engine"
		);

		Ok(MapReduceEngine::from_parts(
			storage,
			EngineShared {
				codecs: self.codecs,
				sequences,
				buckets,
				single_step_limit: self.config.limit_of_items_to_reduce_in_single_step,
			},
		))
	}
}
