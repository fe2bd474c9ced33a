// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Stored values of the map-reduce tables. Auxiliary index entries carry an
//! empty value.

use rollup_core::{Result, SequenceId, Timestamp};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::ReduceType;

pub(crate) trait Row: Serialize + DeserializeOwned {
	fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(self)?)
	}

	fn from_bytes(bytes: &[u8]) -> Result<Self> {
		Ok(postcard::from_bytes(bytes)?)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MappedRow {
	/// The document id as given, before case folding.
	pub document_id: String,
	pub timestamp: Timestamp,
	#[serde(with = "serde_bytes")]
	pub payload: Vec<u8>,
}

impl Row for MappedRow {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ReducedRow {
	pub timestamp: Timestamp,
	#[serde(with = "serde_bytes")]
	pub payload: Vec<u8>,
}

impl Row for ReducedRow {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScheduledRow {
	pub sequence: SequenceId,
	pub timestamp: Timestamp,
}

impl Row for ScheduledRow {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StatRow {
	pub mapped_items_count: i32,
}

impl Row for StatRow {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ReduceTypeRow {
	pub reduce_type: ReduceType,
}

impl Row for ReduceTypeRow {}
