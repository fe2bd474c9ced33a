// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_core::key::fold;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_BUCKET_COUNT: u32 = 1024 * 1024;
pub const DEFAULT_BUCKET_FAN_IN: u32 = 1024;

/// Maps document ids to level-0 buckets and buckets to the bucket they
/// aggregate into one level up.
///
/// The hash is seedless, so assignments are stable across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketAssignment {
	count: u32,
	fan_in: u32,
}

impl Default for BucketAssignment {
	fn default() -> Self {
		Self::new(DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_FAN_IN)
	}
}

impl BucketAssignment {
	/// Zero values are raised to one. `count` is capped at `i32::MAX` so every
	/// bucket fits the key layout.
	pub fn new(count: u32, fan_in: u32) -> Self {
		Self {
			count: count.clamp(1, i32::MAX as u32),
			fan_in: fan_in.clamp(1, i32::MAX as u32),
		}
	}

	pub fn count(&self) -> u32 {
		self.count
	}

	pub fn fan_in(&self) -> u32 {
		self.fan_in
	}

	/// Document ids are case-insensitive, so `Orders/1` and `orders/1` share a bucket.
	pub fn bucket_of(&self, document_id: &str) -> i32 {
		let hash = xxh3_64(fold(document_id).as_bytes());
		(hash % self.count as u64) as i32
	}

	pub fn parent_bucket(&self, bucket: i32) -> i32 {
		bucket.div_euclid(self.fan_in as i32)
	}
}
