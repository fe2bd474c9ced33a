// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{path::Path, sync::Arc};

use rollup_core::DocumentCodec;
use rollup_engine::{EngineBuilder, EngineConfig, MapReduceEngine};
use rollup_store::SqliteConfig;

use crate::init_tracing;

pub fn memory_engine() -> MapReduceEngine {
	init_tracing();
	MapReduceEngine::new(EngineConfig::memory()).unwrap()
}

pub fn sqlite_engine() -> MapReduceEngine {
	init_tracing();
	MapReduceEngine::new(EngineConfig::sqlite(SqliteConfig::in_memory())).unwrap()
}

/// Engine backed by a SQLite file at `path`. Opening the same path again
/// sees the committed rows.
pub fn sqlite_file_engine(path: &Path) -> MapReduceEngine {
	init_tracing();
	MapReduceEngine::new(EngineConfig::sqlite(SqliteConfig::fast(path.join("rollup.db")))).unwrap()
}

/// In-memory engine with `codecs` registered in order.
pub fn engine_with_codecs(codecs: Vec<Arc<dyn DocumentCodec>>) -> MapReduceEngine {
	init_tracing();
	codecs
		.into_iter()
		.fold(EngineBuilder::new(EngineConfig::memory()), |builder, codec| builder.shared_codec(codec))
		.build()
		.unwrap()
}
