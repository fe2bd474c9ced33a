// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbPath {
	File(PathBuf),
	Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
	Memory,
	Wal,
}

impl JournalMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Memory => "MEMORY",
			Self::Wal => "WAL",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronousMode {
	Off,
	Normal,
	Full,
}

impl SynchronousMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Off => "OFF",
			Self::Normal => "NORMAL",
			Self::Full => "FULL",
		}
	}
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
	pub path: DbPath,
	pub journal_mode: JournalMode,
	pub synchronous_mode: SynchronousMode,
}

impl SqliteConfig {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: DbPath::File(path.into()),
			journal_mode: JournalMode::Wal,
			synchronous_mode: SynchronousMode::Normal,
		}
	}

	/// Durable-but-fast settings for tests that need a real file.
	pub fn fast(path: impl Into<PathBuf>) -> Self {
		Self {
			path: DbPath::File(path.into()),
			journal_mode: JournalMode::Wal,
			synchronous_mode: SynchronousMode::Off,
		}
	}

	pub fn in_memory() -> Self {
		Self {
			path: DbPath::Memory,
			journal_mode: JournalMode::Memory,
			synchronous_mode: SynchronousMode::Off,
		}
	}

	pub fn with_journal_mode(mut self, journal_mode: JournalMode) -> Self {
		self.journal_mode = journal_mode;
		self
	}

	pub fn with_synchronous_mode(mut self, synchronous_mode: SynchronousMode) -> Self {
		self.synchronous_mode = synchronous_mode;
		self
	}
}

impl Default for SqliteConfig {
	fn default() -> Self {
		Self::in_memory()
	}
}
