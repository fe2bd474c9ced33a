// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Logical key layout of the map-reduce tables and their auxiliary
//! orderings. Every key starts with `[VERSION, KeyKind]`, so each ordering
//! lives in its own contiguous slice of the keyspace.

use crate::{EncodedKey, Error, encoding::keycode::KeyDeserializer};

mod mapped;
mod reduced;
mod scheduled;
mod stat;

pub use mapped::{MappedResultByDocumentKey, MappedResultKey};
pub use reduced::{ReducedResultBySourceKey, ReducedResultKey};
pub use scheduled::ScheduledReductionKey;
pub use stat::{ReduceKeyStatKey, ReduceTypeKey};

pub(crate) const VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum KeyKind {
	MappedResult = 0x01,
	MappedResultByDocument = 0x02,
	ReducedResult = 0x03,
	ReducedResultBySource = 0x04,
	ScheduledReduction = 0x05,
	ReduceKeyStat = 0x06,
	ReduceType = 0x07,
}

impl TryFrom<u8> for KeyKind {
	type Error = Error;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0x01 => Ok(Self::MappedResult),
			0x02 => Ok(Self::MappedResultByDocument),
			0x03 => Ok(Self::ReducedResult),
			0x04 => Ok(Self::ReducedResultBySource),
			0x05 => Ok(Self::ScheduledReduction),
			0x06 => Ok(Self::ReduceKeyStat),
			0x07 => Ok(Self::ReduceType),
			_ => Err(Error::KeyDecode(format!("unknown key kind {value:#04x}"))),
		}
	}
}

pub trait EncodableKey {
	const KIND: KeyKind;

	fn encode(&self) -> EncodedKey;

	fn decode(key: &EncodedKey) -> Option<Self>
	where
		Self: Sized;
}

/// Views and document ids are case-insensitive identities.
pub fn fold(identity: &str) -> String {
	identity.to_lowercase()
}

/// Reads and checks the `[VERSION, KIND]` header.
pub(crate) fn read_header(de: &mut KeyDeserializer<'_>, kind: KeyKind) -> Option<()> {
	let version = de.read_u8().ok()?;
	if version != VERSION {
		return None;
	}
	let found: KeyKind = de.read_u8().ok()?.try_into().ok()?;
	if found != kind {
		return None;
	}
	Some(())
}
