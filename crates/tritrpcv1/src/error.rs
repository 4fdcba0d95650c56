// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{error, fmt, result};

/// Every way a trit stream, TLEB3 length, payload field, or envelope frame
/// can fail to decode or can reject an encode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// A trit value outside `{0, 1, 2}` was handed to `pack`.
	InvalidTrit(u8),
	/// A T-pack243 byte was `>= 247`.
	InvalidPackByte(u8),
	/// A tail marker (`243..=246`) appeared with no following value byte.
	TruncatedTail,
	/// Ran out of input bytes while scanning a TLEB3 length.
	LengthTruncated,
	/// A TLEB3 digit stream ended without a digit carrying `c == 0`.
	LengthUnterminated,
	/// Ran out of input bytes mid-varint.
	VarintTruncated,
	/// A varint used more than 63 bits of shift.
	VarintOverflow,
	/// Ran out of input reading a bool octet.
	BoolTruncated,
	/// A decoded string/bytes length was negative.
	NegativeLength,
	/// A decoded string/bytes length runs past the end of the buffer.
	LengthExceedsBuffer,
	/// An array/map block count was negative.
	NegativeBlock,
	/// An array/map's terminating count was not zero.
	NonZeroTerminator,
	/// A union index was neither 0 (absent) nor 1 (present).
	InvalidUnionIndex(i64),
	/// Bytes remained in the buffer after a top-level record finished decoding.
	TrailingBytes,
	/// A required field for the given operation was not supplied.
	MissingField(&'static str),
	/// A field was supplied that the given operation does not carry.
	UnsupportedField(&'static str),
	/// The envelope's first field was not `{0xF3, 0x2A}`.
	BadMagic,
	/// A field's length prefix claims more bytes than remain in the frame.
	FieldOverruns,
	/// AEAD tag verification failed.
	TagMismatch,
	/// The frame (or a field within it) exceeds a caller-configured size limit.
	FrameTooLarge,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::InvalidTrit(t) => write!(f, "trit value {} is not in {{0, 1, 2}}", t),
			Error::InvalidPackByte(b) => write!(f, "packed byte {} is not a valid T-pack243 byte", b),
			Error::TruncatedTail => write!(f, "T-pack243 tail marker with no following value byte"),
			Error::LengthTruncated => write!(f, "ran out of input while decoding a TLEB3 length"),
			Error::LengthUnterminated => write!(f, "TLEB3 digit stream never reached a terminating digit"),
			Error::VarintTruncated => write!(f, "ran out of input mid-varint"),
			Error::VarintOverflow => write!(f, "varint uses more than 63 bits of shift"),
			Error::BoolTruncated => write!(f, "ran out of input decoding a bool"),
			Error::NegativeLength => write!(f, "string/bytes length is negative"),
			Error::LengthExceedsBuffer => write!(f, "string/bytes length exceeds remaining buffer"),
			Error::NegativeBlock => write!(f, "array/map block count is negative"),
			Error::NonZeroTerminator => write!(f, "array/map block sequence has a non-zero terminator"),
			Error::InvalidUnionIndex(i) => write!(f, "union index {} is neither 0 nor 1", i),
			Error::TrailingBytes => write!(f, "extra bytes remain after decoding"),
			Error::MissingField(name) => write!(f, "missing required field `{}`", name),
			Error::UnsupportedField(name) => write!(f, "field `{}` is not supported for this operation", name),
			Error::BadMagic => write!(f, "frame does not start with the tritrpcv1 magic"),
			Error::FieldOverruns => write!(f, "field length prefix runs past the end of the frame"),
			Error::TagMismatch => write!(f, "AEAD tag verification failed"),
			Error::FrameTooLarge => write!(f, "frame exceeds the configured maximum size"),
		}
	}
}

impl error::Error for Error {}

/// Convenience alias used throughout this crate.
pub type Result<T> = result::Result<T, Error>;
