// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{EncodableKey, KeyKind, VERSION, fold, read_header};
use crate::{
	EncodedKey, EncodedKeyRange, SequenceId,
	encoding::keycode::{KeyDeserializer, KeySerializer},
	sequence::SEQUENCE_ID_LEN,
};

/// Primary ordering of reduced results: (view, reduce key, level, bucket, source bucket, sequence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedResultKey {
	pub view: String,
	pub reduce_key: String,
	pub level: u8,
	pub bucket: i32,
	pub source_bucket: i32,
	pub sequence: SequenceId,
}

impl ReducedResultKey {
	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn level_scan(view: &str, reduce_key: &str, level: u8) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + reduce_key.len() + 5);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(view))
			.extend_str(reduce_key)
			.extend_u8(level);
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn bucket_scan(view: &str, reduce_key: &str, level: u8, bucket: i32) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + reduce_key.len() + 9);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(view))
			.extend_str(reduce_key)
			.extend_u8(level)
			.extend_i32(bucket);
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn by_source(&self) -> ReducedResultBySourceKey {
		ReducedResultBySourceKey {
			view: self.view.clone(),
			reduce_key: self.reduce_key.clone(),
			level: self.level,
			source_bucket: self.source_bucket,
			bucket: self.bucket,
			sequence: self.sequence,
		}
	}
}

impl EncodableKey for ReducedResultKey {
	const KIND: KeyKind = KeyKind::ReducedResult;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(
			2 + self.view.len() + self.reduce_key.len() + 4 + 1 + 8 + SEQUENCE_ID_LEN,
		);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_str(&self.reduce_key)
			.extend_u8(self.level)
			.extend_i32(self.bucket)
			.extend_i32(self.source_bucket)
			.extend_raw(self.sequence.as_bytes());
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		let view = de.read_str().ok()?;
		let reduce_key = de.read_str().ok()?;
		let level = de.read_u8().ok()?;
		let bucket = de.read_i32().ok()?;
		let source_bucket = de.read_i32().ok()?;
		let sequence = SequenceId::from_slice(de.read_raw(SEQUENCE_ID_LEN).ok()?)?;

		Some(Self {
			view,
			reduce_key,
			level,
			bucket,
			source_bucket,
			sequence,
		})
	}
}

/// Auxiliary ordering of reduced results: (view, reduce key, level, source bucket, bucket, sequence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedResultBySourceKey {
	pub view: String,
	pub reduce_key: String,
	pub level: u8,
	pub source_bucket: i32,
	pub bucket: i32,
	pub sequence: SequenceId,
}

impl ReducedResultBySourceKey {
	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn source_scan(view: &str, reduce_key: &str, level: u8, source_bucket: i32) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + reduce_key.len() + 9);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(view))
			.extend_str(reduce_key)
			.extend_u8(level)
			.extend_i32(source_bucket);
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn primary(&self) -> ReducedResultKey {
		ReducedResultKey {
			view: self.view.clone(),
			reduce_key: self.reduce_key.clone(),
			level: self.level,
			bucket: self.bucket,
			source_bucket: self.source_bucket,
			sequence: self.sequence,
		}
	}
}

impl EncodableKey for ReducedResultBySourceKey {
	const KIND: KeyKind = KeyKind::ReducedResultBySource;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(
			2 + self.view.len() + self.reduce_key.len() + 4 + 1 + 8 + SEQUENCE_ID_LEN,
		);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_str(&self.reduce_key)
			.extend_u8(self.level)
			.extend_i32(self.source_bucket)
			.extend_i32(self.bucket)
			.extend_raw(self.sequence.as_bytes());
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		let view = de.read_str().ok()?;
		let reduce_key = de.read_str().ok()?;
		let level = de.read_u8().ok()?;
		let source_bucket = de.read_i32().ok()?;
		let bucket = de.read_i32().ok()?;
		let sequence = SequenceId::from_slice(de.read_raw(SEQUENCE_ID_LEN).ok()?)?;

		Some(Self {
			view,
			reduce_key,
			level,
			source_bucket,
			bucket,
			sequence,
		})
	}
}
