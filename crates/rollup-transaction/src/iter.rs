// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	collections::{VecDeque, btree_map::Range as BTreeMapRange},
};

use rollup_core::{EncodedKey, EncodedKeyRange, Result};
use rollup_store::{RangeCursor, RawEntry, Storage, StoreBackend};

use crate::Pending;

/// Iterator that merges pending writes with committed rows of a key range.
///
/// Committed rows are pulled from the backend lazily, `batch_size` at a time.
/// When both sides hold the same key the pending write wins, and pending
/// removals hide the committed row.
pub struct RangeIter<'a> {
	store: &'a Storage,
	range: EncodedKeyRange,
	cursor: RangeCursor,
	batch_size: usize,
	buffered: VecDeque<RawEntry>,
	pending: Option<BTreeMapRange<'a, EncodedKey, Pending>>,
	next_pending: Option<(&'a EncodedKey, &'a Pending)>,
	next_committed: Option<RawEntry>,
	done: bool,
}

impl<'a> RangeIter<'a> {
	pub(crate) fn new(
		store: &'a Storage,
		range: EncodedKeyRange,
		pending: Option<BTreeMapRange<'a, EncodedKey, Pending>>,
		batch_size: usize,
	) -> Self {
		let mut iterator = Self {
			store,
			range,
			cursor: RangeCursor::new(),
			batch_size: batch_size.max(1),
			buffered: VecDeque::new(),
			pending,
			next_pending: None,
			next_committed: None,
			done: false,
		};
		iterator.advance_pending();
		iterator
	}

	/// An iterator that yields nothing, for ranges no key can satisfy.
	pub(crate) fn empty(store: &'a Storage) -> Self {
		let mut iterator = Self::new(store, EncodedKeyRange::all(), None, 1);
		iterator.done = true;
		iterator
	}

	fn advance_pending(&mut self) {
		self.next_pending = self.pending.as_mut().and_then(|p| p.next());
	}

	fn advance_committed(&mut self) -> Result<()> {
		if self.buffered.is_empty() && !self.cursor.exhausted {
			let (start, end) = self.range.as_bytes();
			let batch = self.store.range_next(&mut self.cursor, start, end, self.batch_size)?;
			self.buffered.extend(batch.entries);
		}
		self.next_committed = self.buffered.pop_front();
		Ok(())
	}

	fn step(&mut self) -> Result<Option<(EncodedKey, Vec<u8>)>> {
		if self.next_committed.is_none() {
			self.advance_committed()?;
		}

		loop {
			match (self.next_pending.take(), self.next_committed.take()) {
				(Some((pending_key, pending)), Some(committed)) => {
					match pending_key.as_slice().cmp(committed.key.as_slice()) {
						Ordering::Less => {
							self.next_committed = Some(committed);
							self.advance_pending();
							if let Pending::Set(value) = pending {
								return Ok(Some((pending_key.clone(), value.clone())));
							}
						}
						Ordering::Equal => {
							self.advance_pending();
							self.advance_committed()?;
							if let Pending::Set(value) = pending {
								return Ok(Some((pending_key.clone(), value.clone())));
							}
						}
						Ordering::Greater => {
							self.next_pending = Some((pending_key, pending));
							self.advance_committed()?;
							return Ok(Some((EncodedKey(committed.key), committed.value)));
						}
					}
				}
				(Some((pending_key, pending)), None) => {
					self.advance_pending();
					if let Pending::Set(value) = pending {
						return Ok(Some((pending_key.clone(), value.clone())));
					}
				}
				(None, Some(committed)) => {
					self.advance_committed()?;
					return Ok(Some((EncodedKey(committed.key), committed.value)));
				}
				(None, None) => return Ok(None),
			}
		}
	}
}

impl Iterator for RangeIter<'_> {
	type Item = Result<(EncodedKey, Vec<u8>)>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}
		match self.step() {
			Ok(Some(entry)) => Some(Ok(entry)),
			Ok(None) => {
				self.done = true;
				None
			}
			Err(err) => {
				self.done = true;
				Some(Err(err))
			}
		}
	}
}
