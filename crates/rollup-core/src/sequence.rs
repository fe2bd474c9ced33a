// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Sortable, category-scoped identifiers used as etags and watermarks.
//!
//! Layout (16 bytes, compared byte-wise):
//! `[epoch millis: 8 BE][category: 1][counter: 7 BE]`

use std::{
	fmt,
	sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::Timestamp;

pub const SEQUENCE_ID_LEN: usize = 16;

const COUNTER_MASK: u64 = (1 << 56) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SequenceCategory {
	MappedResults = 1,
	ReduceResults = 2,
	ScheduledReductions = 3,
}

impl SequenceCategory {
	fn slot(self) -> usize {
		self as usize - 1
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SequenceId(pub [u8; SEQUENCE_ID_LEN]);

impl SequenceId {
	pub const ZERO: SequenceId = SequenceId([0; SEQUENCE_ID_LEN]);

	pub fn from_parts(epoch: u64, category: SequenceCategory, counter: u64) -> Self {
		let mut bytes = [0u8; SEQUENCE_ID_LEN];
		bytes[..8].copy_from_slice(&epoch.to_be_bytes());
		bytes[8] = category as u8;
		bytes[9..].copy_from_slice(&(counter & COUNTER_MASK).to_be_bytes()[1..]);
		Self(bytes)
	}

	pub fn from_slice(bytes: &[u8]) -> Option<Self> {
		let bytes: [u8; SEQUENCE_ID_LEN] = bytes.try_into().ok()?;
		Some(Self(bytes))
	}

	pub fn as_bytes(&self) -> &[u8; SEQUENCE_ID_LEN] {
		&self.0
	}

	pub fn epoch(&self) -> u64 {
		let mut buf = [0u8; 8];
		buf.copy_from_slice(&self.0[..8]);
		u64::from_be_bytes(buf)
	}

	pub fn counter(&self) -> u64 {
		let mut buf = [0u8; 8];
		buf[1..].copy_from_slice(&self.0[9..]);
		u64::from_be_bytes(buf)
	}
}

impl fmt::Debug for SequenceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SequenceId({self})")
	}
}

impl fmt::Display for SequenceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in &self.0 {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

/// Hands out strictly increasing ids per category for the lifetime of the
/// generator. Ids of a generator created later sort after all ids of an
/// earlier one because the creation time leads the layout.
#[derive(Debug)]
pub struct SequenceGenerator {
	epoch: u64,
	counters: [AtomicU64; 3],
}

impl SequenceGenerator {
	pub fn new() -> Self {
		Self::with_epoch(Timestamp::now().as_millis())
	}

	pub fn with_epoch(epoch: u64) -> Self {
		Self {
			epoch,
			counters: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
		}
	}

	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	pub fn next(&self, category: SequenceCategory) -> SequenceId {
		let counter = self.counters[category.slot()].fetch_add(1, Ordering::AcqRel) + 1;
		SequenceId::from_parts(self.epoch, category, counter)
	}
}

impl Default for SequenceGenerator {
	fn default() -> Self {
		Self::new()
	}
}
