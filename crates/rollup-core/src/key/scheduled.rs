// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{EncodableKey, KeyKind, VERSION, fold, read_header};
use crate::{
	EncodedKey, EncodedKeyRange,
	encoding::keycode::{KeyDeserializer, KeySerializer},
};

/// A pending reduction: (view, level, reduce key, bucket). Scheduling the same
/// work item again replaces the row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduledReductionKey {
	pub view: String,
	pub level: u8,
	pub reduce_key: String,
	pub bucket: i32,
}

impl ScheduledReductionKey {
	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn reduce_key_scan(view: &str, level: u8, reduce_key: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + reduce_key.len() + 5);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(view))
			.extend_u8(level)
			.extend_str(reduce_key);
		EncodedKeyRange::prefix(&serializer.finish())
	}
}

impl EncodableKey for ScheduledReductionKey {
	const KIND: KeyKind = KeyKind::ScheduledReduction;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(2 + self.view.len() + self.reduce_key.len() + 9);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_u8(self.level)
			.extend_str(&self.reduce_key)
			.extend_i32(self.bucket);
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		let view = de.read_str().ok()?;
		let level = de.read_u8().ok()?;
		let reduce_key = de.read_str().ok()?;
		let bucket = de.read_i32().ok()?;

		Some(Self {
			view,
			level,
			reduce_key,
			bucket,
		})
	}
}
