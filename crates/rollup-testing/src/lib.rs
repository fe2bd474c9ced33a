// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Helpers shared by the integration tests of the rollup crates.

mod codec;
mod engine;
mod subscriber;
pub mod tempdir;

pub use codec::{FailingCodec, XorCodec};
pub use engine::{engine_with_codecs, memory_engine, sqlite_engine, sqlite_file_engine};
pub use subscriber::init_tracing;
