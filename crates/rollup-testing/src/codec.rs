// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_core::{DocumentCodec, Error, Result};

/// Reversible codec flipping every byte with a fixed mask.
#[derive(Debug, Clone, Copy)]
pub struct XorCodec(pub u8);

impl DocumentCodec for XorCodec {
	fn name(&self) -> &str {
		"xor"
	}

	fn encode(&self, _reduce_key: &str, mut data: Vec<u8>) -> Result<Vec<u8>> {
		data.iter_mut().for_each(|b| *b ^= self.0);
		Ok(data)
	}

	fn decode(&self, reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>> {
		self.encode(reduce_key, data)
	}
}

/// Passes payloads through on encode and rejects every payload on decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCodec;

impl DocumentCodec for FailingCodec {
	fn name(&self) -> &str {
		"failing"
	}

	fn encode(&self, _reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>> {
		Ok(data)
	}

	fn decode(&self, reduce_key: &str, _data: Vec<u8>) -> Result<Vec<u8>> {
		Err(Error::codec(self.name(), format!("malformed payload for {reduce_key}")))
	}
}
