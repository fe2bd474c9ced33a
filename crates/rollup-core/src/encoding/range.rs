// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::ops::{Bound, RangeBounds};

use super::EncodedKey;

/// A range of encoded keys, used for ordered scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedKeyRange {
	pub start: Bound<EncodedKey>,
	pub end: Bound<EncodedKey>,
}

impl EncodedKeyRange {
	pub fn new(start: Bound<EncodedKey>, end: Bound<EncodedKey>) -> Self {
		Self {
			start,
			end,
		}
	}

	/// Start is inclusive, end is exclusive. `None` leaves that side unbounded.
	pub fn start_end(start: Option<EncodedKey>, end: Option<EncodedKey>) -> Self {
		let start = match start {
			Some(s) => Bound::Included(s),
			None => Bound::Unbounded,
		};
		let end = match end {
			Some(e) => Bound::Excluded(e),
			None => Bound::Unbounded,
		};
		Self {
			start,
			end,
		}
	}

	/// All keys starting with the given prefix.
	pub fn prefix(prefix: &[u8]) -> Self {
		let start = Bound::Included(EncodedKey::new(prefix));
		let end = match prefix.iter().rposition(|&b| b != 0xff) {
			Some(i) => {
				let mut end = prefix[..=i].to_vec();
				end[i] += 1;
				Bound::Excluded(EncodedKey::new(end))
			}
			None => Bound::Unbounded,
		};
		Self {
			start,
			end,
		}
	}

	pub fn all() -> Self {
		Self {
			start: Bound::Unbounded,
			end: Bound::Unbounded,
		}
	}

	/// Borrowed byte bounds, the shape the storage backends take.
	pub fn as_bytes(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
		(as_bytes(&self.start), as_bytes(&self.end))
	}

	pub fn contains_key(&self, key: &[u8]) -> bool {
		let above_start = match &self.start {
			Bound::Included(s) => key >= s.as_slice(),
			Bound::Excluded(s) => key > s.as_slice(),
			Bound::Unbounded => true,
		};
		let below_end = match &self.end {
			Bound::Included(e) => key <= e.as_slice(),
			Bound::Excluded(e) => key < e.as_slice(),
			Bound::Unbounded => true,
		};
		above_start && below_end
	}
}

fn as_bytes(bound: &Bound<EncodedKey>) -> Bound<&[u8]> {
	match bound {
		Bound::Included(k) => Bound::Included(k.as_slice()),
		Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
		Bound::Unbounded => Bound::Unbounded,
	}
}

impl RangeBounds<EncodedKey> for EncodedKeyRange {
	fn start_bound(&self) -> Bound<&EncodedKey> {
		self.start.as_ref()
	}

	fn end_bound(&self) -> Bound<&EncodedKey> {
		self.end.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_prefix() {
		let range = EncodedKeyRange::prefix(&[0x01, 0x02]);
		assert_eq!(range.start, Bound::Included(EncodedKey::new(vec![0x01, 0x02])));
		assert_eq!(range.end, Bound::Excluded(EncodedKey::new(vec![0x01, 0x03])));
	}

	#[test]
	fn test_prefix_trailing_ff() {
		let range = EncodedKeyRange::prefix(&[0x01, 0xff, 0xff]);
		assert_eq!(range.end, Bound::Excluded(EncodedKey::new(vec![0x02])));
	}

	#[test]
	fn test_prefix_all_ff() {
		let range = EncodedKeyRange::prefix(&[0xff, 0xff]);
		assert_eq!(range.end, Bound::Unbounded);
	}

	#[test]
	fn test_contains_key() {
		let range = EncodedKeyRange::prefix(b"ab");
		assert!(range.contains_key(b"ab"));
		assert!(range.contains_key(b"abz"));
		assert!(!range.contains_key(b"ac"));
		assert!(!range.contains_key(b"a"));
	}
}
