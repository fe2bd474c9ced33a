// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use super::{EncodableKey, KeyKind, VERSION, fold, read_header};
use crate::{
	EncodedKey, EncodedKeyRange,
	encoding::keycode::{KeyDeserializer, KeySerializer},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceKeyStatKey {
	pub view: String,
	pub reduce_key: String,
}

impl ReduceKeyStatKey {
	pub fn encoded(view: &str, reduce_key: &str) -> EncodedKey {
		Self {
			view: view.to_string(),
			reduce_key: reduce_key.to_string(),
		}
		.encode()
	}

	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}
}

/// The reduce strategy last performed for a reduce key. Kept apart from the
/// stat row so it outlives a count that drops to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceTypeKey {
	pub view: String,
	pub reduce_key: String,
}

impl ReduceTypeKey {
	pub fn encoded(view: &str, reduce_key: &str) -> EncodedKey {
		Self {
			view: view.to_string(),
			reduce_key: reduce_key.to_string(),
		}
		.encode()
	}

	pub fn view_scan(view: &str) -> EncodedKeyRange {
		let mut serializer = KeySerializer::with_capacity(2 + view.len() + 2);
		serializer.extend_u8(VERSION).extend_u8(Self::KIND as u8).extend_str(&fold(view));
		EncodedKeyRange::prefix(&serializer.finish())
	}
}

impl EncodableKey for ReduceTypeKey {
	const KIND: KeyKind = KeyKind::ReduceType;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(2 + self.view.len() + self.reduce_key.len() + 4);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_str(&self.reduce_key);
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		Some(Self {
			view: de.read_str().ok()?,
			reduce_key: de.read_str().ok()?,
		})
	}
}

impl EncodableKey for ReduceKeyStatKey {
	const KIND: KeyKind = KeyKind::ReduceKeyStat;

	fn encode(&self) -> EncodedKey {
		let mut serializer = KeySerializer::with_capacity(2 + self.view.len() + self.reduce_key.len() + 4);
		serializer
			.extend_u8(VERSION)
			.extend_u8(Self::KIND as u8)
			.extend_str(&fold(&self.view))
			.extend_str(&self.reduce_key);
		serializer.to_encoded_key()
	}

	fn decode(key: &EncodedKey) -> Option<Self> {
		let mut de = KeyDeserializer::from_bytes(key.as_slice());
		read_header(&mut de, Self::KIND)?;

		Some(Self {
			view: de.read_str().ok()?,
			reduce_key: de.read_str().ok()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encode_decode() {
		let encoded = ReduceKeyStatKey::encoded("Sales", "Q1");
		let decoded = ReduceKeyStatKey::decode(&encoded).unwrap();
		assert_eq!(decoded.view, "sales");
		assert_eq!(decoded.reduce_key, "Q1");
		assert!(ReduceKeyStatKey::view_scan("sales").contains_key(&encoded));
		assert!(!ReduceKeyStatKey::view_scan("sale").contains_key(&encoded));
	}

	#[test]
	fn test_reduce_type_key_is_separate_from_stats() {
		let encoded = ReduceTypeKey::encoded("Sales", "Q1");
		let decoded = ReduceTypeKey::decode(&encoded).unwrap();
		assert_eq!(decoded.view, "sales");
		assert_eq!(decoded.reduce_key, "Q1");
		assert!(ReduceTypeKey::view_scan("sales").contains_key(&encoded));
		assert!(!ReduceKeyStatKey::view_scan("sales").contains_key(&encoded));
		assert!(ReduceKeyStatKey::decode(&encoded).is_none());
	}
}
