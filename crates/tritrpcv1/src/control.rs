// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Control-channel handshake records carried alongside the hypergraph
//! payload family: `HelloMessage` advertises what a peer supports, and
//! `ChooseMessage` is the reply naming the selected triple. These exercise
//! the same array/union primitives as `crate::payload`, so they cost
//! nothing extra beyond this module.

use crate::error::{Error, Result};
use crate::payload::{decode_array, decode_option, decode_string, encode_array, encode_option, encode_string_into};

/// Advertises the modes, cipher suites, and compression algorithms a peer
/// is willing to use, plus an optional context URI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HelloMessage {
	pub modes: Vec<String>,
	pub suites: Vec<String>,
	pub compression: Vec<String>,
	pub context_uri: Option<String>,
}

pub fn encode_hello(msg: &HelloMessage) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend(encode_array(&msg.modes));
	out.extend(encode_array(&msg.suites));
	out.extend(encode_array(&msg.compression));
	out.extend(encode_option(&msg.context_uri));
	out
}

pub fn decode_hello(buf: &[u8]) -> Result<HelloMessage> {
	let (modes, off) = decode_array::<String>(buf, 0)?;
	let (suites, off) = decode_array::<String>(buf, off)?;
	let (compression, off) = decode_array::<String>(buf, off)?;
	let (context_uri, off) = decode_option::<String>(buf, off)?;
	if off != buf.len() {
		return Err(Error::TrailingBytes);
	}
	Ok(HelloMessage { modes, suites, compression, context_uri })
}

/// The triple a peer selected out of a `HelloMessage`'s offered sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChooseMessage {
	pub mode: String,
	pub suite: String,
	pub compression: String,
}

pub fn encode_choose(msg: &ChooseMessage) -> Vec<u8> {
	let mut out = Vec::new();
	encode_string_into(&mut out, &msg.mode);
	encode_string_into(&mut out, &msg.suite);
	encode_string_into(&mut out, &msg.compression);
	out
}

pub fn decode_choose(buf: &[u8]) -> Result<ChooseMessage> {
	let (mode, off) = decode_string(buf, 0)?;
	let (suite, off) = decode_string(buf, off)?;
	let (compression, off) = decode_string(buf, off)?;
	if off != buf.len() {
		return Err(Error::TrailingBytes);
	}
	Ok(ChooseMessage { mode, suite, compression })
}
