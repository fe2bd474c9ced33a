// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{EncodableKey, KeyKind, VERSION, fold, read_header};
use crate::{
	EncodedKey, EncodedKeyRange, SequenceId,
	encoding::keycode::{KeyDeserializer, KeySerializer},
	sequence::SEQUENCE_ID_LEN,
};

/// Primary ordering of mapped results: (view, reduce key, bucket, document, sequence).
///
/// The sequence id is part of the key, so mapping the same document twice
/// without deleting first keeps both rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedResultKey {
	pub view: String,
	pub reduce_key: String,
	pub bucket: i32,
	pub document_id: String,
	pub sequence: SequenceId,
}

impl MappedResultKey {
	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn reduce_key_scan(view: &str, reduce_key: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + reduce_key.len() + 4);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view)).extend_str(reduce_key);
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn bucket_scan(view: &str, reduce_key: &str, bucket: i32) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + reduce_key.len() + 8);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(view))
			.extend_str(reduce_key)
			.extend_i32(bucket);
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn by_document(&self) -> MappedResultByDocumentKey {
		MappedResultByDocumentKey {
			view: self.view.clone(),
			document_id: self.document_id.clone(),
			reduce_key: self.reduce_key.clone(),
			bucket: self.bucket,
			sequence: self.sequence,
		}
	}
}

impl EncodableKey for MappedResultKey {
	const KIND: KeyKind = KeyKind::MappedResult;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(
			2 + self.view.len() + self.reduce_key.len() + self.document_id.len() + 6 + 4 + SEQUENCE_ID_LEN,
		);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_str(&self.reduce_key)
			.extend_i32(self.bucket)
			.extend_str(&fold(&self.document_id))
			.extend_raw(self.sequence.as_bytes());
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		let view = de.read_str().ok()?;
		let reduce_key = de.read_str().ok()?;
		let bucket = de.read_i32().ok()?;
		let document_id = de.read_str().ok()?;
		let sequence = SequenceId::from_slice(de.read_raw(SEQUENCE_ID_LEN).ok()?)?;

		Some(Self {
			view,
			reduce_key,
			bucket,
			document_id,
			sequence,
		})
	}
}

/// Auxiliary ordering of mapped results: (view, document, reduce key, bucket, sequence).
/// Carries no value; the primary row is found through [`Self::primary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedResultByDocumentKey {
	pub view: String,
	pub document_id: String,
	pub reduce_key: String,
	pub bucket: i32,
	pub sequence: SequenceId,
}

impl MappedResultByDocumentKey {
	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn document_scan(view: &str, document_id: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + document_id.len() + 4);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(view))
			.extend_str(&fold(document_id));
		EncodedKeyRange::prefix(&serializer.finish())
	}

	pub fn primary(&self) -> MappedResultKey {
		MappedResultKey {
			view: self.view.clone(),
			reduce_key: self.reduce_key.clone(),
			bucket: self.bucket,
			document_id: self.document_id.clone(),
			sequence: self.sequence,
		}
	}
}

impl EncodableKey for MappedResultByDocumentKey {
	const KIND: KeyKind = KeyKind::MappedResultByDocument;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(
			2 + self.view.len() + self.reduce_key.len() + self.document_id.len() + 6 + 4 + SEQUENCE_ID_LEN,
		);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_str(&fold(&self.document_id))
			.extend_str(&self.reduce_key)
			.extend_i32(self.bucket)
			.extend_raw(self.sequence.as_bytes());
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		let view = de.read_str().ok()?;
		let document_id = de.read_str().ok()?;
		let reduce_key = de.read_str().ok()?;
		let bucket = de.read_i32().ok()?;
		let sequence = SequenceId::from_slice(de.read_raw(SEQUENCE_ID_LEN).ok()?)?;

		Some(Self {
			view,
			document_id,
			reduce_key,
			bucket,
			sequence,
		})
	}
}
