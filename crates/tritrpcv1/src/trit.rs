// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! T-pack243: bijective encoding of ternary digit streams into octets.
//!
//! Groups of 5 trits pack into one octet in `0..=242`. A trailing residue of
//! `1..=4` trits packs into a two-byte tail: a marker byte `243 + (k - 1)`
//! followed by the `k`-trit value. Bytes `>= 247` never occur on the wire.

use crate::error::{Error, Result};

const GROUP_LEN: usize = 5;
const TAIL_BASE: u8 = 243;

/// Packs a stream of trits (each `0..=2`) into octets.
///
/// ```
/// use tritrpcv1::trit::pack;
/// assert_eq!(pack(&[2, 1, 0, 0, 2]).unwrap(), vec![0xBF]);
/// assert_eq!(pack(&[2, 2, 1]).unwrap(), vec![0xF5, 0x19]);
/// ```
pub fn pack(trits: &[u8]) -> Result<Vec<u8>> {
	let mut out = Vec::with_capacity(trits.len() / GROUP_LEN + 3);
	let mut chunks = trits.chunks_exact(GROUP_LEN);
	for group in &mut chunks {
		out.push(pack_group(group)?);
	}
	let tail = chunks.remainder();
	if !tail.is_empty() {
		let k = tail.len();
		out.push(TAIL_BASE + (k as u8 - 1));
		out.push(pack_group(tail)?);
	}
	Ok(out)
}

fn pack_group(trits: &[u8]) -> Result<u8> {
	let mut val: u32 = 0;
	for &t in trits {
		if t > 2 {
			return Err(Error::InvalidTrit(t));
		}
		val = val * 3 + t as u32;
	}
	Ok(val as u8)
}

/// Unpacks T-pack243 octets back into a trit stream.
///
/// ```
/// use tritrpcv1::trit::{pack, unpack};
/// let trits = [2u8, 1, 0, 0, 2, 2, 2, 1];
/// assert_eq!(unpack(&pack(&trits).unwrap()).unwrap(), trits);
/// ```
pub fn unpack(bytes: &[u8]) -> Result<Vec<u8>> {
	let mut trits = Vec::with_capacity(bytes.len() * GROUP_LEN / 4);
	let mut i = 0;
	while i < bytes.len() {
		let b = bytes[i];
		i += 1;
		if b <= 242 {
			push_group(&mut trits, b as u32, GROUP_LEN);
		} else if (243..=246).contains(&b) {
			let k = (b - TAIL_BASE + 1) as usize;
			let Some(&val) = bytes.get(i) else {
				return Err(Error::TruncatedTail);
			};
			i += 1;
			push_group(&mut trits, val as u32, k);
		} else {
			return Err(Error::InvalidPackByte(b));
		}
	}
	Ok(trits)
}

/// Unpacks the trits carried in `bytes`, MSD-first, into `group[..k]`.
fn push_group(trits: &mut Vec<u8>, mut val: u32, k: usize) {
	let start = trits.len();
	trits.resize(start + k, 0);
	for j in (0..k).rev() {
		trits[start + j] = (val % 3) as u8;
		val /= 3;
	}
}

/// Number of octets `pack` would emit for `trit_count` trits, without
/// actually packing them. Used by the TLEB3 decoder to recompute how many
/// input octets a partially-consumed digit stream spans.
pub fn packed_len(trit_count: usize) -> usize {
	let full_groups = trit_count / GROUP_LEN;
	let tail = trit_count % GROUP_LEN;
	full_groups + if tail > 0 { 2 } else { 0 }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pack_micro_vectors() {
		assert_eq!(pack(&[2, 1, 0, 0, 2]).unwrap(), vec![0xBF]);
		assert_eq!(pack(&[2, 2, 1]).unwrap(), vec![0xF5, 0x19]);
	}

	#[test]
	fn pack_empty_is_empty() {
		assert_eq!(pack(&[]).unwrap(), Vec::<u8>::new());
		assert_eq!(unpack(&[]).unwrap(), Vec::<u8>::new());
	}

	#[test]
	fn round_trip_various_lengths() {
		for len in 0..=17 {
			let trits: Vec<u8> = (0..len).map(|i| (i % 3) as u8).collect();
			let packed = pack(&trits).unwrap();
			assert_eq!(unpack(&packed).unwrap(), trits, "len={}", len);
		}
	}

	#[test]
	fn invalid_trit_rejected() {
		assert_eq!(pack(&[0, 1, 3, 0, 0]), Err(Error::InvalidTrit(3)));
	}

	#[test]
	fn invalid_pack_byte_rejected() {
		assert_eq!(unpack(&[247]), Err(Error::InvalidPackByte(247)));
		assert_eq!(unpack(&[255]), Err(Error::InvalidPackByte(255)));
	}

	#[test]
	fn truncated_tail_rejected() {
		assert_eq!(unpack(&[243]), Err(Error::TruncatedTail));
	}

	#[test]
	fn tail_variants_round_trip() {
		for k in 1..=4usize {
			let trits: Vec<u8> = (0..k).map(|i| (i % 3) as u8).collect();
			let packed = pack(&trits).unwrap();
			assert_eq!(packed.len(), 2);
			assert_eq!(packed[0], TAIL_BASE + (k as u8 - 1));
			assert_eq!(unpack(&packed).unwrap(), trits);
		}
	}
}
