// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_store::Delta;

/// A buffered write, applied to the backend on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
	Set(Vec<u8>),
	Remove,
}

impl Pending {
	pub(crate) fn into_delta(self, key: Vec<u8>) -> Delta {
		match self {
			Pending::Set(value) => Delta::Set {
				key,
				value,
			},
			Pending::Remove => Delta::Remove {
				key,
			},
		}
	}
}
