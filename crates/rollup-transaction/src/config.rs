// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use rollup_store::{BackendConfig, SqliteConfig};

/// Background compaction once the storage has been left alone for a while.
#[derive(Debug, Clone)]
pub struct IdleConfig {
	/// Time without a batch or query before the backend gets compacted.
	pub idle_after: Duration,
	/// How often the worker checks for idleness.
	pub poll_interval: Duration,
}

impl Default for IdleConfig {
	fn default() -> Self {
		Self {
			idle_after: Duration::from_secs(60),
			poll_interval: Duration::from_secs(1),
		}
	}
}

impl IdleConfig {
	pub fn new(idle_after: Duration) -> Self {
		Self {
			idle_after,
			..Default::default()
		}
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
	pub backend: BackendConfig,
	pub idle: Option<IdleConfig>,
	/// Rows fetched from the backend per range call.
	pub range_batch_size: usize,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: BackendConfig::Memory,
			idle: None,
			range_batch_size: 256,
		}
	}
}

impl StorageConfig {
	pub fn memory() -> Self {
		Self::default()
	}

	pub fn sqlite(config: SqliteConfig) -> Self {
		Self {
			backend: BackendConfig::Sqlite(config),
			..Default::default()
		}
	}

	pub fn with_idle(mut self, idle: IdleConfig) -> Self {
		self.idle = Some(idle);
		self
	}

	pub fn with_range_batch_size(mut self, range_batch_size: usize) -> Self {
		self.range_batch_size = range_batch_size.max(1);
		self
	}
}
