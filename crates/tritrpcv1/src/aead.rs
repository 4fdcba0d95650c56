// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The AEAD binder: XChaCha20-Poly1305 over an empty plaintext, used only
//! to bind the tag to everything that precedes it in the frame (`spec`
//! §6). There is no secret payload content here; the "ciphertext" is
//! always empty and the tag is the whole authentication value.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use log::warn;
use subtle::ConstantTimeEq;

use crate::constants::{KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::envelope::{build_frame, parse_envelope, parse_envelope_bounded, Envelope};
use crate::error::{Error, Result};

/// Computes the 16-byte tag binding `aad` under `key`/`nonce`.
pub fn seal(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], aad: &[u8]) -> Result<[u8; TAG_LEN]> {
	let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
	let nonce = XNonce::from_slice(nonce);
	let ciphertext = cipher
		.encrypt(nonce, Payload { msg: &[], aad })
		.map_err(|_| Error::TagMismatch)?;
	let mut tag = [0u8; TAG_LEN];
	if ciphertext.len() != TAG_LEN {
		return Err(Error::TagMismatch);
	}
	tag.copy_from_slice(&ciphertext);
	Ok(tag)
}

fn verify(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], aad: &[u8], tag: &[u8; TAG_LEN]) -> Result<()> {
	let expected = seal(key, nonce, aad)?;
	if expected.ct_eq(tag).unwrap_u8() == 1 {
		Ok(())
	} else {
		warn!("AEAD tag mismatch over {} AAD bytes", aad.len());
		Err(Error::TagMismatch)
	}
}

/// Builds an AEAD-bound frame via the two-pass encode: build with no tag to
/// get the AAD preimage, seal it, then rebuild with the tag appended.
/// Earlier fields are byte-identical between the two builds.
#[allow(clippy::too_many_arguments)]
pub fn build_sealed_frame(
	service: &str,
	method: &str,
	payload: &[u8],
	aux: Option<&[u8]>,
	compress: bool,
	key: &[u8; KEY_LEN],
	nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
	let aad = build_frame(service, method, payload, aux, None, true, compress);
	let tag = seal(key, nonce, &aad)?;
	Ok(build_frame(service, method, payload, aux, Some(&tag), true, compress))
}

/// Parses `frame` and, if its `aead` flag is set, verifies the tag against
/// `frame[..tag_field_start]` using `key`/`nonce`. Returns
/// [`Error::MissingField`] if the flag is set but no tag field is present.
pub fn parse_and_verify(frame: &[u8], key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN]) -> Result<Envelope> {
	let env = parse_envelope(frame)?;
	if !env.aead {
		return Ok(env);
	}
	let tag = env.tag.ok_or(Error::MissingField("tag"))?;
	let tag_start = env.tag_field_start.ok_or(Error::MissingField("tag"))?;
	verify(key, nonce, &frame[..tag_start], &tag)?;
	Ok(env)
}

/// As [`parse_and_verify`], but rejects `frame` with [`Error::FrameTooLarge`]
/// before parsing if it exceeds `max_len`. The boundary a caller should use
/// when `frame` comes from an untrusted source (`spec` §5).
pub fn parse_and_verify_bounded(
	frame: &[u8],
	max_len: usize,
	key: &[u8; KEY_LEN],
	nonce: &[u8; NONCE_LEN],
) -> Result<Envelope> {
	let env = parse_envelope_bounded(frame, max_len)?;
	if !env.aead {
		return Ok(env);
	}
	let tag = env.tag.ok_or(Error::MissingField("tag"))?;
	let tag_start = env.tag_field_start.ok_or(Error::MissingField("tag"))?;
	verify(key, nonce, &frame[..tag_start], &tag)?;
	Ok(env)
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: [u8; KEY_LEN] = [0u8; KEY_LEN];
	const NONCE: [u8; NONCE_LEN] = [1u8; NONCE_LEN];

	#[test]
	fn seal_and_verify_round_trip() {
		let frame = build_sealed_frame("hg", "AddVertex", b"payload", None, false, &KEY, &NONCE).unwrap();
		let env = parse_and_verify(&frame, &KEY, &NONCE).unwrap();
		assert_eq!(env.payload, b"payload");
		assert!(env.aead);
	}

	#[test]
	fn tampering_before_tag_is_detected() {
		let mut frame = build_sealed_frame("hg", "AddVertex", b"payload", None, false, &KEY, &NONCE).unwrap();
		// Flip a byte inside the service field, well before the tag.
		frame[3] ^= 0xFF;
		assert_eq!(parse_and_verify(&frame, &KEY, &NONCE), Err(Error::TagMismatch));
	}

	#[test]
	fn wrong_nonce_is_detected() {
		let frame = build_sealed_frame("hg", "AddVertex", b"payload", None, false, &KEY, &NONCE).unwrap();
		let wrong_nonce = [2u8; NONCE_LEN];
		assert_eq!(parse_and_verify(&frame, &KEY, &wrong_nonce), Err(Error::TagMismatch));
	}

	#[test]
	fn non_aead_frame_skips_verification() {
		let frame = build_frame("hg", "AddVertex", b"payload", None, None, false, false);
		let env = parse_and_verify(&frame, &KEY, &NONCE).unwrap();
		assert!(!env.aead);
		assert!(env.tag.is_none());
	}

	#[test]
	fn bounded_verify_rejects_oversized_frame_before_checking_the_tag() {
		let frame = build_sealed_frame("hg", "AddVertex", b"payload", None, false, &KEY, &NONCE).unwrap();
		assert_eq!(parse_and_verify_bounded(&frame, frame.len() - 1, &KEY, &NONCE), Err(Error::FrameTooLarge));
		assert!(parse_and_verify_bounded(&frame, frame.len(), &KEY, &NONCE).is_ok());
	}
}
