// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{env, fs, path::Path};

use uuid::Uuid;

/// Runs `f` inside a fresh directory under the system temp dir and removes
/// the directory afterwards.
pub fn temp_dir<F, T>(f: F) -> T
where
	F: FnOnce(&Path) -> T,
{
	let path = env::temp_dir().join(format!("rollup-{}", Uuid::new_v4()));
	fs::create_dir_all(&path).unwrap();

	let result = f(&path);

	let _ = fs::remove_dir_all(&path);
	result
}
