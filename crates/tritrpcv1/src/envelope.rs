// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The envelope: a fixed-order sequence of TLEB3-length-prefixed fields
//! carrying a request or response to a `service`/`method` pair, with
//! optional trailing `aux` and AEAD `tag` fields (`spec` §5).

use log::{debug, trace, warn};

use crate::constants::{CONTEXT_ID, MAGIC, MODE_TRIT, SCHEMA_ID, TAG_LEN, VERSION_TRIT};
use crate::error::{Error, Result};
use crate::tleb3;
use crate::trit;

fn write_field(out: &mut Vec<u8>, bytes: &[u8]) {
	out.extend(tleb3::encode_len(bytes.len() as u64));
	out.extend_from_slice(bytes);
}

fn read_field(buf: &[u8], offset: usize) -> Result<(&[u8], usize)> {
	let (len, off) = tleb3::decode_len(buf, offset)?;
	let end = off.checked_add(len as usize).ok_or(Error::FieldOverruns)?;
	if end > buf.len() {
		return Err(Error::FieldOverruns);
	}
	Ok((&buf[off..end], end))
}

/// The three flag bits (`aead`, `compress`, reserved) packed into the
/// `flags` field (`spec` §5).
fn flags_trits(aead: bool, compress: bool) -> [u8; 3] {
	[if aead { 2 } else { 0 }, if compress { 2 } else { 0 }, 0]
}

/// A fully-decoded envelope frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
	pub version: u8,
	pub mode: u8,
	pub aead: bool,
	pub compress: bool,
	pub schema_id: [u8; 32],
	pub context_id: [u8; 32],
	pub service: String,
	pub method: String,
	pub payload: Vec<u8>,
	pub aux: Option<Vec<u8>>,
	pub tag: Option<[u8; 16]>,
	/// Byte offset into the original frame where the tag field's length
	/// prefix begins, if a tag is present. AEAD verification uses
	/// `frame[..tag_field_start]` as the authenticated prefix.
	pub tag_field_start: Option<usize>,
}

/// Builds a frame. Pass `tag = None` to get the AAD preimage a caller signs
/// before a second call with `tag = Some(..)` appends the bound tag field
/// (`spec` §6's two-pass encode). Earlier fields' bytes are identical
/// between the two calls: this only ever appends.
#[allow(clippy::too_many_arguments)]
pub fn build_frame(
	service: &str,
	method: &str,
	payload: &[u8],
	aux: Option<&[u8]>,
	tag: Option<&[u8; TAG_LEN]>,
	aead: bool,
	compress: bool,
) -> Vec<u8> {
	let mut out = Vec::with_capacity(128 + payload.len());
	write_field(&mut out, &MAGIC);
	write_field(&mut out, &trit::pack(&[VERSION_TRIT]).expect("version trit is valid"));
	write_field(&mut out, &trit::pack(&[MODE_TRIT]).expect("mode trit is valid"));
	write_field(&mut out, &trit::pack(&flags_trits(aead, compress)).expect("flag trits are valid"));
	write_field(&mut out, &SCHEMA_ID);
	write_field(&mut out, &CONTEXT_ID);
	write_field(&mut out, service.as_bytes());
	write_field(&mut out, method.as_bytes());
	write_field(&mut out, payload);
	if let Some(aux) = aux {
		write_field(&mut out, aux);
	}
	if let Some(tag) = tag {
		write_field(&mut out, tag);
	}
	trace!(
		"built frame: service={} method={} payload_len={} aead={} compress={} aux={} tag={}",
		service,
		method,
		payload.len(),
		aead,
		compress,
		aux.is_some(),
		tag.is_some()
	);
	out
}

fn decode_single_trit(bytes: &[u8]) -> Result<u8> {
	let trits = trit::unpack(bytes)?;
	trits.first().copied().ok_or(Error::TruncatedTail)
}

fn decode_flags(bytes: &[u8]) -> Result<(bool, bool)> {
	let trits = trit::unpack(bytes)?;
	let aead = trits.first().copied().unwrap_or(0) == 2;
	let compress = trits.get(1).copied().unwrap_or(0) == 2;
	Ok((aead, compress))
}

fn read_trailing_fields(buf: &[u8], offset: usize) -> Result<Vec<(usize, &[u8], usize)>> {
	let mut fields = Vec::new();
	let mut off = offset;
	while off < buf.len() {
		let start = off;
		let (field, noff) = read_field(buf, off)?;
		fields.push((start, field, noff));
		off = noff;
	}
	Ok(fields)
}

/// Parses a frame, applying the tail-disambiguation rule for `aux`/`tag`
/// (`spec` §5): zero trailing fields means neither is present; with AEAD
/// off a single trailing field is `aux`; with AEAD on, one trailing field
/// is `tag` and two are `aux` then `tag`; any other count is
/// [`Error::TrailingBytes`].
pub fn parse_envelope(frame: &[u8]) -> Result<Envelope> {
	let (magic, off) = read_field(frame, 0)?;
	if magic != MAGIC {
		warn!("rejecting frame with bad magic: {:02x?}", magic);
		return Err(Error::BadMagic);
	}
	let (version_bytes, off) = read_field(frame, off)?;
	let version = decode_single_trit(version_bytes)?;
	let (mode_bytes, off) = read_field(frame, off)?;
	let mode = decode_single_trit(mode_bytes)?;
	let (flags_bytes, off) = read_field(frame, off)?;
	let (aead, compress) = decode_flags(flags_bytes)?;
	let (schema_bytes, off) = read_field(frame, off)?;
	let (context_bytes, off) = read_field(frame, off)?;
	let (service_bytes, off) = read_field(frame, off)?;
	let (method_bytes, off) = read_field(frame, off)?;
	let (payload_bytes, off) = read_field(frame, off)?;

	let mut schema_id = [0u8; 32];
	if schema_bytes.len() == 32 {
		schema_id.copy_from_slice(schema_bytes);
	}
	let mut context_id = [0u8; 32];
	if context_bytes.len() == 32 {
		context_id.copy_from_slice(context_bytes);
	}

	let trailing = read_trailing_fields(frame, off)?;
	let (aux, tag, tag_field_start) = match (trailing.len(), aead) {
		(0, _) => (None, None, None),
		(1, false) => (Some(trailing[0].1.to_vec()), None, None),
		(1, true) => {
			let (start, bytes, _) = trailing[0];
			let tag = copy_tag(bytes)?;
			(None, Some(tag), Some(start))
		}
		(2, true) => {
			let (_, aux_bytes, _) = trailing[0];
			let (start, tag_bytes, _) = trailing[1];
			let tag = copy_tag(tag_bytes)?;
			(Some(aux_bytes.to_vec()), Some(tag), Some(start))
		}
		_ => return Err(Error::TrailingBytes),
	};

	debug!("parsed envelope: service={:?} method={:?} aead={}", String::from_utf8_lossy(service_bytes), String::from_utf8_lossy(method_bytes), aead);

	Ok(Envelope {
		version,
		mode,
		aead,
		compress,
		schema_id,
		context_id,
		service: String::from_utf8_lossy(service_bytes).into_owned(),
		method: String::from_utf8_lossy(method_bytes).into_owned(),
		payload: payload_bytes.to_vec(),
		aux,
		tag,
		tag_field_start,
	})
}

/// Rejects `frame` with [`Error::FrameTooLarge`] before scanning a single
/// field if it exceeds `max_len`, then parses it normally. A parser boundary
/// reading untrusted input (the `verify` fixtures file, a network peer)
/// should call this instead of [`parse_envelope`] directly (`spec` §5).
pub fn parse_envelope_bounded(frame: &[u8], max_len: usize) -> Result<Envelope> {
	if frame.len() > max_len {
		warn!("rejecting frame of {} bytes, over the {}-byte limit", frame.len(), max_len);
		return Err(Error::FrameTooLarge);
	}
	parse_envelope(frame)
}

fn copy_tag(bytes: &[u8]) -> Result<[u8; TAG_LEN]> {
	if bytes.len() != TAG_LEN {
		return Err(Error::FieldOverruns);
	}
	let mut tag = [0u8; TAG_LEN];
	tag.copy_from_slice(bytes);
	Ok(tag)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip_no_aux_no_tag() {
		let frame = build_frame("hg", "AddVertex", b"payload-bytes", None, None, false, false);
		let env = parse_envelope(&frame).unwrap();
		assert_eq!(env.service, "hg");
		assert_eq!(env.method, "AddVertex");
		assert_eq!(env.payload, b"payload-bytes");
		assert!(env.aux.is_none());
		assert!(env.tag.is_none());
		assert!(!env.aead);
		assert_eq!(env.schema_id, SCHEMA_ID);
		assert_eq!(env.context_id, CONTEXT_ID);
	}

	#[test]
	fn round_trip_with_aux_aead_off() {
		let frame = build_frame("hg", "AddVertex", b"p", Some(b"aux-data"), None, false, false);
		let env = parse_envelope(&frame).unwrap();
		assert_eq!(env.aux, Some(b"aux-data".to_vec()));
		assert!(env.tag.is_none());
	}

	#[test]
	fn round_trip_with_tag_aead_on() {
		let tag = [7u8; TAG_LEN];
		let frame = build_frame("hg", "AddVertex", b"p", None, Some(&tag), true, false);
		let env = parse_envelope(&frame).unwrap();
		assert!(env.aux.is_none());
		assert!(env.aead);
		let tag_field_len = tleb3::encode_len(TAG_LEN as u64).len() + TAG_LEN;
		assert_eq!(env.tag, Some(tag));
		assert_eq!(env.tag_field_start, Some(frame.len() - tag_field_len));
	}

	#[test]
	fn round_trip_with_aux_and_tag_aead_on() {
		let tag = [9u8; TAG_LEN];
		let frame = build_frame("hg", "AddVertex", b"p", Some(b"aux"), Some(&tag), true, true);
		let env = parse_envelope(&frame).unwrap();
		assert_eq!(env.aux, Some(b"aux".to_vec()));
		assert_eq!(env.tag, Some(tag));
		assert!(env.compress);
	}

	#[test]
	fn two_trailing_fields_with_aead_off_is_trailing_bytes() {
		let mut frame = build_frame("hg", "AddVertex", b"p", Some(b"aux"), None, false, false);
		// Append a second spurious trailing field by hand.
		let mut extra = tleb3::encode_len(1);
		extra.push(0xAB);
		frame.extend(extra);
		assert_eq!(parse_envelope(&frame), Err(Error::TrailingBytes));
	}

	#[test]
	fn bad_magic_rejected() {
		let mut frame = build_frame("hg", "AddVertex", b"p", None, None, false, false);
		let prefix_len = tleb3::encode_len(MAGIC.len() as u64).len();
		frame[prefix_len] = 0x00;
		assert_eq!(parse_envelope(&frame), Err(Error::BadMagic));
	}

	#[test]
	fn truncated_frame_reports_field_overruns_or_length_error() {
		let frame = build_frame("hg", "AddVertex", b"p", None, None, false, false);
		let truncated = &frame[..frame.len() - 3];
		assert!(parse_envelope(truncated).is_err());
	}

	#[test]
	fn bounded_parse_rejects_oversized_frames_before_scanning() {
		let frame = build_frame("hg", "AddVertex", b"payload", None, None, false, false);
		assert_eq!(parse_envelope_bounded(&frame, frame.len() - 1), Err(Error::FrameTooLarge));
		assert_eq!(parse_envelope_bounded(&frame, frame.len()).unwrap(), parse_envelope(&frame).unwrap());
	}
}
