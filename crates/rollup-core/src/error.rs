// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
	/// A bucket result lookup was asked for a level outside {0, 1, 2}.
	#[error("invalid level: {level}")]
	InvalidLevel {
		level: u8,
	},

	/// A document codec rejected its input. Propagated unchanged to the caller.
	#[error("codec '{codec}' failed: {message}")]
	Codec {
		codec: String,
		message: String,
	},

	#[error("serialization failed: {0}")]
	Serialization(String),

	#[error("storage failure: {0}")]
	Storage(String),

	#[error("malformed key: {0}")]
	KeyDecode(String),

	#[error("storage has been disposed")]
	Disposed,

	#[error("worker failure: {0}")]
	Worker(String),
}

impl Error {
	pub fn codec(codec: impl Into<String>, message: impl ToString) -> Self {
		Self::Codec {
			codec: codec.into(),
			message: message.to_string(),
		}
	}

	pub fn storage(message: impl ToString) -> Self {
		Self::Storage(message.to_string())
	}
}

impl From<postcard::Error> for Error {
	fn from(err: postcard::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}
