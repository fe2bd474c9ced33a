// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Metrics for tracking CommandTransaction operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionMetrics {
	pub reads: usize,
	pub writes: usize,
	pub removes: usize,
	pub range_scans: usize,
}

impl TransactionMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn increment_reads(&mut self) {
		self.reads += 1;
	}

	pub fn increment_writes(&mut self) {
		self.writes += 1;
	}

	pub fn increment_removes(&mut self) {
		self.removes += 1;
	}

	pub fn increment_range_scans(&mut self) {
		self.range_scans += 1;
	}
}
