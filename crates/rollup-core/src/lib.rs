// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared building blocks for the rollup map-reduce engine: the error type,
//! order-preserving key encoding, the logical key layout of every table,
//! sequence identifiers and the document codec chain.

pub mod codec;
pub mod encoding;
pub mod error;
pub mod key;
pub mod sequence;
pub mod time;

pub use codec::{CodecChain, DocumentCodec, ZstdCodec};
pub use encoding::{EncodedKey, EncodedKeyRange};
pub use error::{Error, Result};
pub use key::{EncodableKey, KeyKind};
pub use sequence::{SequenceCategory, SequenceGenerator, SequenceId};
pub use time::Timestamp;
