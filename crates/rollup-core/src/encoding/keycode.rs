// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Keycode is a lexicographical order-preserving binary encoding for keys in
//! ordered key/value stores. Scans over a leading group of fields become
//! plain prefix scans.
//!
//! * `u8`: raw byte.
//! * `u64`: big-endian.
//! * `i32`: big-endian, sign bit flipped.
//! * byte strings and strings: `0x00` escaped as `0x00ff`, terminated with
//!   `0x0000`. The terminator makes the encoding prefix-free, so `"a"` never
//!   matches a prefix scan for `"ab"`.
//! * fixed-width raw bytes: copied verbatim.

use crate::{EncodedKey, Error, Result};

#[derive(Debug, Default)]
pub struct KeySerializer {
	buffer: Vec<u8>,
}

impl KeySerializer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			buffer: Vec::with_capacity(capacity),
		}
	}

	pub fn extend_u8(&mut self, value: u8) -> &mut Self {
		self.buffer.push(value);
		self
	}

	pub fn extend_u64(&mut self, value: u64) -> &mut Self {
		self.buffer.extend_from_slice(&value.to_be_bytes());
		self
	}

	pub fn extend_i32(&mut self, value: i32) -> &mut Self {
		let mut bytes = value.to_be_bytes();
		bytes[0] ^= 0x80;
		self.buffer.extend_from_slice(&bytes);
		self
	}

	pub fn extend_bytes(&mut self, bytes: &[u8]) -> &mut Self {
		for &byte in bytes {
			if byte == 0x00 {
				self.buffer.extend_from_slice(&[0x00, 0xff]);
			} else {
				self.buffer.push(byte);
			}
		}
		self.buffer.extend_from_slice(&[0x00, 0x00]);
		self
	}

	pub fn extend_str(&mut self, value: &str) -> &mut Self {
		self.extend_bytes(value.as_bytes())
	}

	/// Fixed-width values whose byte order already sorts correctly.
	pub fn extend_raw(&mut self, bytes: &[u8]) -> &mut Self {
		self.buffer.extend_from_slice(bytes);
		self
	}

	pub fn len(&self) -> usize {
		self.buffer.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buffer.is_empty()
	}

	pub fn finish(self) -> Vec<u8> {
		self.buffer
	}

	pub fn to_encoded_key(self) -> EncodedKey {
		EncodedKey::new(self.buffer)
	}
}

pub struct KeyDeserializer<'a> {
	input: &'a [u8],
}

impl<'a> KeyDeserializer<'a> {
	pub fn from_bytes(input: &'a [u8]) -> Self {
		Self {
			input,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.input.is_empty()
	}

	pub fn remaining(&self) -> &'a [u8] {
		self.input
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8]> {
		if self.input.len() < len {
			return Err(Error::KeyDecode(format!(
				"expected {len} bytes, found {} at {:x?}",
				self.input.len(),
				self.input
			)));
		}
		let (head, tail) = self.input.split_at(len);
		self.input = tail;
		Ok(head)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}

	pub fn read_u64(&mut self) -> Result<u64> {
		let bytes = self.take(8)?;
		let mut buf = [0u8; 8];
		buf.copy_from_slice(bytes);
		Ok(u64::from_be_bytes(buf))
	}

	pub fn read_i32(&mut self) -> Result<i32> {
		let bytes = self.take(4)?;
		let mut buf = [0u8; 4];
		buf.copy_from_slice(bytes);
		buf[0] ^= 0x80;
		Ok(i32::from_be_bytes(buf))
	}

	pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
		let mut out = Vec::new();
		let mut iter = self.input.iter().copied().enumerate();
		let consumed = loop {
			match iter.next() {
				Some((_, 0x00)) => match iter.next() {
					Some((i, 0x00)) => break i + 1,
					Some((_, 0xff)) => out.push(0x00),
					Some((_, b)) => {
						return Err(Error::KeyDecode(format!("invalid escape byte {b:#04x}")));
					}
					None => return Err(Error::KeyDecode("unterminated byte string".to_string())),
				},
				Some((_, b)) => out.push(b),
				None => return Err(Error::KeyDecode("unterminated byte string".to_string())),
			}
		};
		self.input = &self.input[consumed..];
		Ok(out)
	}

	pub fn read_str(&mut self) -> Result<String> {
		let bytes = self.read_bytes()?;
		String::from_utf8(bytes).map_err(|e| Error::KeyDecode(e.to_string()))
	}

	pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8]> {
		self.take(len)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn encode_str(s: &str) -> Vec<u8> {
		let mut serializer = KeySerializer::new();
		serializer.extend_str(s);
		serializer.finish()
	}

	fn encode_i32(v: i32) -> Vec<u8> {
		let mut serializer = KeySerializer::new();
		serializer.extend_i32(v);
		serializer.finish()
	}

	#[test]
	fn test_str_encoding() {
		assert_eq!(encode_str("foo"), vec![0x66, 0x6f, 0x6f, 0x00, 0x00]);
		assert_eq!(encode_str(""), vec![0x00, 0x00]);
		assert_eq!(encode_str("a\0b"), vec![0x61, 0x00, 0xff, 0x62, 0x00, 0x00]);
	}

	#[test]
	fn test_str_order_preserving() {
		assert!(encode_str("a") < encode_str("ab"));
		assert!(encode_str("ab") < encode_str("b"));
		assert!(encode_str("") < encode_str("a"));
		assert!(encode_str("a\0") < encode_str("a\u{1}"));
	}

	#[test]
	fn test_str_prefix_free() {
		let a = encode_str("a");
		let ab = encode_str("ab");
		assert!(!ab.starts_with(&a));
	}

	#[test]
	fn test_i32_order_preserving() {
		let values = [i32::MIN, -1024, -1, 0, 1, 1024, i32::MAX];
		for pair in values.windows(2) {
			assert!(encode_i32(pair[0]) < encode_i32(pair[1]), "{} < {}", pair[0], pair[1]);
		}
		assert_eq!(encode_i32(0), vec![0x80, 0x00, 0x00, 0x00]);
	}

	#[test]
	fn test_read_back() {
		let mut serializer = KeySerializer::with_capacity(32);
		serializer.extend_u8(0x01).extend_str("view\0x").extend_i32(-7).extend_u64(42).extend_raw(&[9, 9]);
		let bytes = serializer.finish();

		let mut de = KeyDeserializer::from_bytes(&bytes);
		assert_eq!(de.read_u8().unwrap(), 0x01);
		assert_eq!(de.read_str().unwrap(), "view\0x");
		assert_eq!(de.read_i32().unwrap(), -7);
		assert_eq!(de.read_u64().unwrap(), 42);
		assert_eq!(de.read_raw(2).unwrap(), &[9, 9]);
		assert!(de.is_empty());
	}

	#[test]
	fn test_unterminated_string() {
		let mut de = KeyDeserializer::from_bytes(&[0x61, 0x62]);
		assert!(matches!(de.read_str(), Err(Error::KeyDecode(_))));
	}

	#[test]
	fn test_short_input() {
		let mut de = KeyDeserializer::from_bytes(&[0x01, 0x02]);
		assert!(de.read_u64().is_err());
	}
}
