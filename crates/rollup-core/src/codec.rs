// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Pluggable payload transforms (compression, encryption, ...) applied to
//! every stored map and reduce payload.

use std::{fmt, sync::Arc};

use serde_json::Value;
use tracing::instrument;

use crate::{Error, Result};

pub trait DocumentCodec: Send + Sync {
	fn name(&self) -> &str;

	fn encode(&self, reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>>;

	fn decode(&self, reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>>;
}

/// Codecs in registration order. The first registered codec sits closest to
/// storage: encoding runs the chain back to front and decoding front to back.
#[derive(Clone, Default)]
pub struct CodecChain {
	codecs: Vec<Arc<dyn DocumentCodec>>,
}

impl CodecChain {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, codec: impl DocumentCodec + 'static) -> Self {
		self.codecs.push(Arc::new(codec));
		self
	}

	pub fn push(&mut self, codec: Arc<dyn DocumentCodec>) {
		self.codecs.push(codec);
	}

	pub fn len(&self) -> usize {
		self.codecs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.codecs.is_empty()
	}

	pub fn encode(&self, reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>> {
		self.codecs.iter().rev().try_fold(data, |data, codec| codec.encode(reduce_key, data))
	}

	pub fn decode(&self, reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>> {
		self.codecs.iter().try_fold(data, |data, codec| codec.decode(reduce_key, data))
	}

	#[instrument(name = "codec::encode_document", level = "trace", skip(self, document), fields(codecs = self.codecs.len()))]
	pub fn encode_document(&self, reduce_key: &str, document: &Value) -> Result<Vec<u8>> {
		let bytes = serde_json::to_vec(document)?;
		self.encode(reduce_key, bytes)
	}

	#[instrument(name = "codec::decode_document", level = "trace", skip(self, data), fields(codecs = self.codecs.len(), len = data.len()))]
	pub fn decode_document(&self, reduce_key: &str, data: &[u8]) -> Result<Value> {
		let bytes = self.decode(reduce_key, data.to_vec())?;
		Ok(serde_json::from_slice(&bytes)?)
	}
}

impl fmt::Debug for CodecChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.codecs.iter().map(|c| c.name())).finish()
	}
}

/// Zstandard compression of the payload.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
	level: i32,
}

impl ZstdCodec {
	pub fn new(level: i32) -> Self {
		Self {
			level,
		}
	}
}

impl Default for ZstdCodec {
	fn default() -> Self {
		Self::new(3)
	}
}

impl DocumentCodec for ZstdCodec {
	fn name(&self) -> &str {
		"zstd"
	}

	fn encode(&self, _reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>> {
		zstd::encode_all(data.as_slice(), self.level).map_err(|e| Error::codec(self.name(), e))
	}

	fn decode(&self, _reduce_key: &str, data: Vec<u8>) -> Result<Vec<u8>> {
		zstd::decode_all(data.as_slice()).map_err(|e| Error::codec(self.name(), e))
	}
}
