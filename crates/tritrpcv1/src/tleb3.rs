// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! TLEB3: a variable-length unsigned length codec built on little-endian
//! base-9 digits, each carried as three trits `(continuation, hi, lo)`, and
//! packed through [`crate::trit`].

use crate::error::{Error, Result};
use crate::trit;

/// Encodes `n` as a TLEB3 length. `n == 0` always encodes to the single
/// digit `0`, i.e. `trit::pack(&[0, 0, 0])`.
pub fn encode_len(n: u64) -> Vec<u8> {
	let mut digits = Vec::new();
	if n == 0 {
		digits.push(0u8);
	} else {
		let mut n = n;
		while n > 0 {
			digits.push((n % 9) as u8);
			n /= 9;
		}
	}

	let last = digits.len() - 1;
	let mut trits = Vec::with_capacity(digits.len() * 3);
	for (i, &d) in digits.iter().enumerate() {
		trits.push(if i < last { 2 } else { 0 });
		trits.push(d / 3);
		trits.push(d % 3);
	}
	trit::pack(&trits).expect("TLEB3 digit trits are always in 0..=2")
}

/// One T-pack243 unit: either a single full-group byte (5 trits) or a
/// tail-marker byte plus its value byte (1..=4 trits).
enum UnitError {
	Eof,
	Invalid(u8),
}

fn read_unit(buf: &[u8], off: usize) -> core::result::Result<(Vec<u8>, usize), UnitError> {
	let b = *buf.get(off).ok_or(UnitError::Eof)?;
	let mut noff = off + 1;
	if b <= 242 {
		Ok((unpack_base3(b as u32, 5), noff))
	} else if (243..=246).contains(&b) {
		let k = (b - 243 + 1) as usize;
		let val = *buf.get(noff).ok_or(UnitError::Eof)?;
		noff += 1;
		Ok((unpack_base3(val as u32, k), noff))
	} else {
		Err(UnitError::Invalid(b))
	}
}

fn unpack_base3(mut val: u32, k: usize) -> Vec<u8> {
	let mut trits = vec![0u8; k];
	for slot in trits.iter_mut().rev() {
		*slot = (val % 3) as u8;
		val /= 3;
	}
	trits
}

/// Scans `trits` from the start for a terminated (`c == 0`) digit run,
/// returning its accumulated value and the trit count it spans.
fn try_terminate(trits: &[u8]) -> Option<(u64, usize)> {
	let mut value: u64 = 0;
	let mut mul: u64 = 1;
	let digit_count = trits.len() / 3;
	for j in 0..digit_count {
		let (c, p1, p0) = (trits[3 * j], trits[3 * j + 1], trits[3 * j + 2]);
		value += (p1 as u64 * 3 + p0 as u64) * mul;
		if c == 0 {
			return Some((value, (j + 1) * 3));
		}
		mul *= 9;
	}
	None
}

/// Decodes a TLEB3 length starting at `buf[offset..]`.
///
/// Returns the decoded value and the offset immediately past the bytes it
/// consumed. `offset` and the returned offset are absolute positions in
/// `buf`, matching the "length-prefix then value" framing used throughout
/// the envelope (§4.5).
pub fn decode_len(buf: &[u8], offset: usize) -> Result<(u64, usize)> {
	let mut trits: Vec<u8> = Vec::new();
	let mut off = offset;
	loop {
		match read_unit(buf, off) {
			Ok((unit, new_off)) => {
				trits.extend_from_slice(&unit);
				off = new_off;
			}
			Err(UnitError::Invalid(b)) => return Err(Error::InvalidPackByte(b)),
			Err(UnitError::Eof) => {
				return Err(if trits.len() < 3 { Error::LengthTruncated } else { Error::LengthUnterminated });
			}
		}
		if let Some((value, used_trits)) = try_terminate(&trits) {
			let used_bytes = trit::packed_len(used_trits);
			return Ok((value, offset + used_bytes));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_is_a_single_tail_byte() {
		let enc = encode_len(0);
		assert_eq!(enc, trit::pack(&[0, 0, 0]).unwrap());
	}

	#[test]
	fn round_trip_micro_vectors() {
		for &n in &[0u64, 1, 2, 3, 8, 9, 10, 123, 4096, 65535] {
			let enc = encode_len(n);
			assert!(!enc.is_empty());
			let (val, used) = decode_len(&enc, 0).unwrap();
			assert_eq!(val, n);
			assert_eq!(used, enc.len());
		}
	}

	#[test]
	fn round_trip_wide_sweep() {
		let probes: Vec<u64> =
			(0..2000u64).chain((0..63u32).map(|b| 1u64.checked_shl(b).unwrap_or(u64::MAX))).collect();
		for n in probes {
			let enc = encode_len(n);
			let (val, used) = decode_len(&enc, 0).unwrap();
			assert_eq!(val, n, "n={}", n);
			assert_eq!(used, enc.len());
		}
	}

	#[test]
	fn decode_honors_leading_offset() {
		let prefix = [0xAAu8, 0xBB];
		let mut buf = prefix.to_vec();
		buf.extend(encode_len(4096));
		let (val, used) = decode_len(&buf, prefix.len()).unwrap();
		assert_eq!(val, 4096);
		assert_eq!(used, buf.len());
	}

	#[test]
	fn truncated_input_is_reported() {
		assert_eq!(decode_len(&[], 0), Err(Error::LengthTruncated));
		// a single byte that would start a multi-digit number but never terminates
		let enc = encode_len(65535);
		assert!(enc.len() > 1);
		let err = decode_len(&enc[..enc.len() - 1], 0).unwrap_err();
		assert!(matches!(err, Error::LengthTruncated | Error::LengthUnterminated));
	}
}
