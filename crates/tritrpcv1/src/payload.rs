// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The hypergraph request/response payload codec: zig-zag varints, bool,
//! string/bytes, blocked array/map framing, union-by-index, and the
//! `Vertex` / `Hyperedge` / `HGRequest` / `HGResponse` records that carry
//! them. This is the payload the envelope (`crate::envelope`) transports.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use crate::error::{Error, Result};
use crate::varint;

/// Attribute maps on `Vertex`/`Hyperedge` are `map<string, string>`. A
/// `BTreeMap` gives encoding a deterministic key order; the wire format
/// itself is order-agnostic.
pub type AttrMap = BTreeMap<String, String>;

/// A type that can append its wire representation to a growing buffer.
pub trait WireEncode {
	fn wire_encode(&self, out: &mut Vec<u8>);
}

/// A type that can be read back off a buffer at a given offset.
pub trait WireDecode: Sized {
	fn wire_decode(buf: &[u8], offset: usize) -> Result<(Self, usize)>;
}

impl WireEncode for String {
	fn wire_encode(&self, out: &mut Vec<u8>) {
		encode_string_into(out, self);
	}
}

impl WireDecode for String {
	fn wire_decode(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
		decode_string(buf, offset)
	}
}

impl WireEncode for i64 {
	fn wire_encode(&self, out: &mut Vec<u8>) {
		out.extend(varint::encode_long(*self));
	}
}

impl WireDecode for i64 {
	fn wire_decode(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
		varint::decode_long(buf, offset)
	}
}

impl WireEncode for i32 {
	fn wire_encode(&self, out: &mut Vec<u8>) {
		out.extend(varint::encode_int(*self));
	}
}

impl WireDecode for i32 {
	fn wire_decode(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
		varint::decode_int(buf, offset)
	}
}

/// Encodes `s` (length-prefixed UTF-8) into `out`.
pub fn encode_string_into(out: &mut Vec<u8>, s: &str) {
	let bytes = s.as_bytes();
	out.extend(varint::encode_long(bytes.len() as i64));
	out.extend_from_slice(bytes);
}

/// Encodes a standalone string.
pub fn encode_string(s: &str) -> Vec<u8> {
	let mut out = Vec::new();
	encode_string_into(&mut out, s);
	out
}

/// Decodes a length-prefixed string. Bytes that are not valid UTF-8 are
/// replaced with `U+FFFD`, matching how the rest of this codec tolerates
/// malformed payload bytes without inventing a dedicated error kind for
/// them.
pub fn decode_string(buf: &[u8], offset: usize) -> Result<(String, usize)> {
	let (bytes, end) = decode_length_prefixed(buf, offset)?;
	Ok((String::from_utf8_lossy(bytes).into_owned(), end))
}

/// Encodes an opaque byte string.
pub fn encode_bytes(b: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(b.len() + 5);
	out.extend(varint::encode_long(b.len() as i64));
	out.extend_from_slice(b);
	out
}

/// Decodes an opaque byte string, returning an owned copy.
pub fn decode_bytes(buf: &[u8], offset: usize) -> Result<(Vec<u8>, usize)> {
	let (bytes, end) = decode_length_prefixed(buf, offset)?;
	Ok((bytes.to_vec(), end))
}

fn decode_length_prefixed(buf: &[u8], offset: usize) -> Result<(&[u8], usize)> {
	let (len, off) = varint::decode_long(buf, offset)?;
	if len < 0 {
		return Err(Error::NegativeLength);
	}
	let len = len as usize;
	let end = off.checked_add(len).ok_or(Error::LengthExceedsBuffer)?;
	if end > buf.len() {
		return Err(Error::LengthExceedsBuffer);
	}
	Ok((&buf[off..end], end))
}

/// Encodes a single array block followed by the zero terminator, or a bare
/// zero count when `items` is empty.
pub fn encode_array<T: WireEncode>(items: &[T]) -> Vec<u8> {
	if items.is_empty() {
		return varint::encode_long(0);
	}
	let mut out = varint::encode_long(items.len() as i64);
	for item in items {
		item.wire_encode(&mut out);
	}
	out.extend(varint::encode_long(0));
	out
}

/// Decodes a single array block followed by its zero terminator. Rejects a
/// negative block count and a non-zero terminator, matching the stricter
/// single-block contract this codec emits (`spec` §4.3, §9).
pub fn decode_array<T: WireDecode>(buf: &[u8], offset: usize) -> Result<(Vec<T>, usize)> {
	let (count, off) = varint::decode_long(buf, offset)?;
	if count == 0 {
		return Ok((Vec::new(), off));
	}
	if count < 0 {
		return Err(Error::NegativeBlock);
	}
	let mut out = Vec::with_capacity(count as usize);
	let mut off = off;
	for _ in 0..count {
		let (item, noff) = T::wire_decode(buf, off)?;
		out.push(item);
		off = noff;
	}
	let (term, off) = varint::decode_long(buf, off)?;
	if term != 0 {
		return Err(Error::NonZeroTerminator);
	}
	Ok((out, off))
}

/// Encodes a `map<string, string>` the same way `encode_array` encodes a
/// sequence: one block of key/value pairs, then the zero terminator.
pub fn encode_string_map(m: &AttrMap) -> Vec<u8> {
	if m.is_empty() {
		return varint::encode_long(0);
	}
	let mut out = varint::encode_long(m.len() as i64);
	for (k, v) in m {
		encode_string_into(&mut out, k);
		encode_string_into(&mut out, v);
	}
	out.extend(varint::encode_long(0));
	out
}

/// Decodes a `map<string, string>`.
pub fn decode_string_map(buf: &[u8], offset: usize) -> Result<(AttrMap, usize)> {
	let (count, off) = varint::decode_long(buf, offset)?;
	if count == 0 {
		return Ok((AttrMap::new(), off));
	}
	if count < 0 {
		return Err(Error::NegativeBlock);
	}
	let mut out = AttrMap::new();
	let mut off = off;
	for _ in 0..count {
		let (k, noff) = decode_string(buf, off)?;
		let (v, noff) = decode_string(buf, noff)?;
		out.insert(k, v);
		off = noff;
	}
	let (term, off) = varint::decode_long(buf, off)?;
	if term != 0 {
		return Err(Error::NonZeroTerminator);
	}
	Ok((out, off))
}

/// Encodes `Option<T>` as a union: index 0 (absent, no payload) or index 1
/// (present, followed by `T`'s encoding).
pub fn encode_option<T: WireEncode>(value: &Option<T>) -> Vec<u8> {
	let mut out = Vec::new();
	match value {
		None => out.extend(varint::encode_long(0)),
		Some(v) => {
			out.extend(varint::encode_long(1));
			v.wire_encode(&mut out);
		}
	}
	out
}

fn append_absent(out: &mut Vec<u8>) {
	out.extend(varint::encode_long(0));
}

fn append_present<T: WireEncode>(out: &mut Vec<u8>, value: &T) {
	out.extend(varint::encode_long(1));
	value.wire_encode(out);
}

/// Decodes a union-encoded `Option<T>`.
pub fn decode_option<T: WireDecode>(buf: &[u8], offset: usize) -> Result<(Option<T>, usize)> {
	let (idx, off) = varint::decode_long(buf, offset)?;
	match idx {
		0 => Ok((None, off)),
		1 => {
			let (v, off) = T::wire_decode(buf, off)?;
			Ok((Some(v), off))
		}
		other => Err(Error::InvalidUnionIndex(other)),
	}
}

/// A graph vertex: `vid: string, label: union{absent|string}, attr: map<string,string>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vertex {
	pub vid: String,
	pub label: Option<String>,
	pub attr: AttrMap,
}

impl Vertex {
	pub fn new(vid: impl Into<String>) -> Self {
		Vertex { vid: vid.into(), label: None, attr: AttrMap::new() }
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

impl WireEncode for Vertex {
	fn wire_encode(&self, out: &mut Vec<u8>) {
		encode_string_into(out, &self.vid);
		out.extend(encode_option(&self.label));
		out.extend(encode_string_map(&self.attr));
	}
}

impl WireDecode for Vertex {
	fn wire_decode(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
		let (vid, off) = decode_string(buf, offset)?;
		let (label, off) = decode_option::<String>(buf, off)?;
		let (attr, off) = decode_string_map(buf, off)?;
		Ok((Vertex { vid, label, attr }, off))
	}
}

/// A hyperedge: `eid: string, members: array<string>, weight: union{absent|int64}, attr: map<string,string>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hyperedge {
	pub eid: String,
	pub members: Vec<String>,
	pub weight: Option<i64>,
	pub attr: AttrMap,
}

impl Hyperedge {
	pub fn new(eid: impl Into<String>, members: Vec<String>) -> Self {
		Hyperedge { eid: eid.into(), members, weight: None, attr: AttrMap::new() }
	}

	pub fn with_weight(mut self, weight: i64) -> Self {
		self.weight = Some(weight);
		self
	}
}

impl WireEncode for Hyperedge {
	fn wire_encode(&self, out: &mut Vec<u8>) {
		encode_string_into(out, &self.eid);
		out.extend(encode_array(&self.members));
		out.extend(encode_option(&self.weight));
		out.extend(encode_string_map(&self.attr));
	}
}

impl WireDecode for Hyperedge {
	fn wire_decode(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
		let (eid, off) = decode_string(buf, offset)?;
		let (members, off) = decode_array::<String>(buf, off)?;
		let (weight, off) = decode_option::<i64>(buf, off)?;
		let (attr, off) = decode_string_map(buf, off)?;
		Ok((Hyperedge { eid, members, weight, attr }, off))
	}
}

/// The six supported `HGRequest` operations, wire-identical to a zig-zag
/// int32 (`spec` §3, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Op {
	AddVertex = 0,
	AddHyperedge = 1,
	RemoveVertex = 2,
	RemoveHyperedge = 3,
	QueryNeighbors = 4,
	GetSubgraph = 5,
}

impl TryFrom<i32> for Op {
	type Error = i32;

	fn try_from(v: i32) -> core::result::Result<Self, i32> {
		Ok(match v {
			0 => Op::AddVertex,
			1 => Op::AddHyperedge,
			2 => Op::RemoveVertex,
			3 => Op::RemoveHyperedge,
			4 => Op::QueryNeighbors,
			5 => Op::GetSubgraph,
			other => return Err(other),
		})
	}
}

impl From<Op> for i32 {
	fn from(op: Op) -> i32 {
		op as i32
	}
}

/// A hypergraph request. `op` is kept as the raw wire integer (rather than
/// `Op`) so a decoded request with an operation this crate doesn't know
/// about still round-trips; `encode_hg_request` is the validating
/// convenience builder described in `spec` §4.3.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HGRequest {
	pub op: i32,
	pub vertex: Option<Vertex>,
	pub hyperedge: Option<Hyperedge>,
	pub vid: Option<String>,
	pub eid: Option<String>,
	pub k: Option<i32>,
}

impl HGRequest {
	fn raw(op: Op) -> Self {
		HGRequest { op: op.into(), ..Default::default() }
	}

	pub fn add_vertex(vid: impl Into<String>, label: Option<String>) -> Self {
		let mut req = Self::raw(Op::AddVertex);
		req.vertex = Some(Vertex { vid: vid.into(), label, attr: AttrMap::new() });
		req
	}

	pub fn add_hyperedge(eid: impl Into<String>, members: Vec<String>, weight: Option<i64>) -> Self {
		let mut req = Self::raw(Op::AddHyperedge);
		req.hyperedge = Some(Hyperedge { eid: eid.into(), members, weight, attr: AttrMap::new() });
		req
	}

	pub fn remove_vertex(vid: impl Into<String>) -> Self {
		let mut req = Self::raw(Op::RemoveVertex);
		req.vid = Some(vid.into());
		req
	}

	pub fn remove_hyperedge(eid: impl Into<String>) -> Self {
		let mut req = Self::raw(Op::RemoveHyperedge);
		req.eid = Some(eid.into());
		req
	}

	pub fn query_neighbors(vid: impl Into<String>, k: Option<i32>) -> Self {
		let mut req = Self::raw(Op::QueryNeighbors);
		req.vid = Some(vid.into());
		req.k = k;
		req
	}

	pub fn get_subgraph(vid: impl Into<String>, k: Option<i32>) -> Self {
		let mut req = Self::raw(Op::GetSubgraph);
		req.vid = Some(vid.into());
		req.k = k;
		req
	}
}

/// Encodes `req` per the per-op builder contract of `spec` §4.3: `op`
/// followed by the six unions `(vertex, hyperedge, vid, eid, k)`, with only
/// the designated slot for the op carrying index 1.
pub fn encode_hg_request(req: &HGRequest) -> Result<Vec<u8>> {
	let op = Op::try_from(req.op).map_err(|_| Error::UnsupportedField("op"))?;
	let mut out = Vec::new();
	out.extend(varint::encode_int(req.op));

	let vertex_slot = |out: &mut Vec<u8>| -> Result<()> {
		match &req.vertex {
			Some(v) if v.attr.is_empty() => append_present(out, v),
			Some(_) => return Err(Error::UnsupportedField("vertex.attr")),
			None => return Err(Error::MissingField("vertex")),
		}
		Ok(())
	};
	let vertex_absent = |out: &mut Vec<u8>| append_absent(out);

	match op {
		Op::AddVertex => {
			vertex_slot(&mut out)?;
			vertex_absent(&mut out); // hyperedge
			vertex_absent(&mut out); // vid
			vertex_absent(&mut out); // eid
			vertex_absent(&mut out); // k
		}
		Op::AddHyperedge => {
			vertex_absent(&mut out); // vertex
			match &req.hyperedge {
				Some(e) if e.attr.is_empty() => append_present(&mut out, e),
				Some(_) => return Err(Error::UnsupportedField("hyperedge.attr")),
				None => return Err(Error::MissingField("hyperedge")),
			}
			vertex_absent(&mut out); // vid
			vertex_absent(&mut out); // eid
			vertex_absent(&mut out); // k
		}
		Op::RemoveVertex => {
			vertex_absent(&mut out); // vertex
			vertex_absent(&mut out); // hyperedge
			let vid = req.vid.as_ref().ok_or(Error::MissingField("vid"))?;
			append_present(&mut out, vid);
			vertex_absent(&mut out); // eid
			vertex_absent(&mut out); // k
		}
		Op::RemoveHyperedge => {
			vertex_absent(&mut out); // vertex
			vertex_absent(&mut out); // hyperedge
			vertex_absent(&mut out); // vid
			let eid = req.eid.as_ref().ok_or(Error::MissingField("eid"))?;
			append_present(&mut out, eid);
			vertex_absent(&mut out); // k
		}
		Op::QueryNeighbors | Op::GetSubgraph => {
			vertex_absent(&mut out); // vertex
			vertex_absent(&mut out); // hyperedge
			let vid = req.vid.as_ref().ok_or(Error::MissingField("vid"))?;
			append_present(&mut out, vid);
			vertex_absent(&mut out); // eid
			let k = req.k.unwrap_or(1);
			append_present(&mut out, &k);
		}
	}

	Ok(out)
}

/// Decodes an `HGRequest`, without enforcing the per-op cross-field
/// requirements (`spec` §4.3 reserves those for the encoder contract; a
/// decoder just reports whatever slots the frame actually filled).
pub fn decode_hg_request(buf: &[u8]) -> Result<HGRequest> {
	let (op, off) = varint::decode_int(buf, 0)?;
	let (vertex, off) = decode_option::<Vertex>(buf, off)?;
	let (hyperedge, off) = decode_option::<Hyperedge>(buf, off)?;
	let (vid, off) = decode_option::<String>(buf, off)?;
	let (eid, off) = decode_option::<String>(buf, off)?;
	let (k, off) = decode_option::<i32>(buf, off)?;
	if off != buf.len() {
		return Err(Error::TrailingBytes);
	}
	Ok(HGRequest { op, vertex, hyperedge, vid, eid, k })
}

/// A hypergraph response: `ok: bool, err: union{absent|string}, vertices: array<Vertex>, edges: array<Hyperedge>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HGResponse {
	pub ok: bool,
	pub err: Option<String>,
	pub vertices: Vec<Vertex>,
	pub edges: Vec<Hyperedge>,
}

pub fn encode_hg_response(resp: &HGResponse) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend(varint::encode_bool(resp.ok));
	out.extend(encode_option(&resp.err));
	out.extend(encode_array(&resp.vertices));
	out.extend(encode_array(&resp.edges));
	out
}

pub fn decode_hg_response(buf: &[u8]) -> Result<HGResponse> {
	let (ok, off) = varint::decode_bool(buf, 0)?;
	let (err, off) = decode_option::<String>(buf, off)?;
	let (vertices, off) = decode_array::<Vertex>(buf, off)?;
	let (edges, off) = decode_array::<Hyperedge>(buf, off)?;
	if off != buf.len() {
		return Err(Error::TrailingBytes);
	}
	Ok(HGResponse { ok, err, vertices, edges })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn string_round_trip() {
		for s in ["", "a", "hello world", "unicode \u{1F980}"] {
			let enc = encode_string(s);
			let (val, used) = decode_string(&enc, 0).unwrap();
			assert_eq!(val, s);
			assert_eq!(used, enc.len());
		}
	}

	#[test]
	fn array_empty_and_nonempty() {
		let empty: Vec<String> = Vec::new();
		assert_eq!(encode_array(&empty), vec![0x00]);
		let (decoded, used) = decode_array::<String>(&[0x00], 0).unwrap();
		assert!(decoded.is_empty());
		assert_eq!(used, 1);

		let items = vec!["a".to_string(), "bb".to_string()];
		let enc = encode_array(&items);
		let (decoded, used) = decode_array::<String>(&enc, 0).unwrap();
		assert_eq!(decoded, items);
		assert_eq!(used, enc.len());
	}

	#[test]
	fn array_rejects_negative_and_nonzero_terminator() {
		// count = -1 zig-zag encoded
		let neg = varint::encode_long(-1);
		assert_eq!(decode_array::<String>(&neg, 0), Err(Error::NegativeBlock));

		let mut buf = varint::encode_long(1);
		encode_string_into(&mut buf, "x");
		buf.extend(varint::encode_long(2)); // non-zero terminator
		assert_eq!(decode_array::<String>(&buf, 0), Err(Error::NonZeroTerminator));
	}

	#[test]
	fn map_round_trip() {
		let mut m = AttrMap::new();
		m.insert("k1".to_string(), "v1".to_string());
		m.insert("k2".to_string(), "v2".to_string());
		let enc = encode_string_map(&m);
		let (decoded, used) = decode_string_map(&enc, 0).unwrap();
		assert_eq!(decoded, m);
		assert_eq!(used, enc.len());
	}

	#[test]
	fn union_micro_vector_absent() {
		let none: Option<String> = None;
		assert_eq!(encode_option(&none), vec![0x00]);
	}

	#[test]
	fn invalid_union_index_rejected() {
		let buf = varint::encode_long(5);
		assert_eq!(decode_option::<String>(&buf, 0), Err(Error::InvalidUnionIndex(5)));
	}

	#[test]
	fn vertex_round_trip() {
		let v = Vertex::new("a").with_label("A");
		let mut buf = Vec::new();
		v.wire_encode(&mut buf);
		let (decoded, used) = Vertex::wire_decode(&buf, 0).unwrap();
		assert_eq!(decoded, v);
		assert_eq!(used, buf.len());
	}

	#[test]
	fn hyperedge_round_trip() {
		let e = Hyperedge::new("e1", vec!["a".into(), "b".into()]).with_weight(7);
		let mut buf = Vec::new();
		e.wire_encode(&mut buf);
		let (decoded, used) = Hyperedge::wire_decode(&buf, 0).unwrap();
		assert_eq!(decoded, e);
		assert_eq!(used, buf.len());
	}

	#[test]
	fn add_vertex_request_round_trip() {
		let req = HGRequest::add_vertex("a", Some("A".to_string()));
		let enc = encode_hg_request(&req).unwrap();
		let decoded = decode_hg_request(&enc).unwrap();
		assert_eq!(decoded.op, Op::AddVertex as i32);
		assert!(decoded.vertex.is_some());
		assert!(decoded.hyperedge.is_none());
		assert!(decoded.vid.is_none());
		assert!(decoded.eid.is_none());
		assert!(decoded.k.is_none());
		assert_eq!(decoded, req);
	}

	#[test]
	fn add_vertex_missing_vertex_fails() {
		let req = HGRequest::raw(Op::AddVertex);
		assert_eq!(encode_hg_request(&req), Err(Error::MissingField("vertex")));
	}

	#[test]
	fn add_vertex_with_attr_rejected() {
		let mut req = HGRequest::raw(Op::AddVertex);
		let mut v = Vertex::new("a");
		v.attr.insert("x".into(), "y".into());
		req.vertex = Some(v);
		assert_eq!(encode_hg_request(&req), Err(Error::UnsupportedField("vertex.attr")));
	}

	#[test]
	fn query_neighbors_defaults_k_to_one() {
		let req = HGRequest::query_neighbors("a", None);
		let enc = encode_hg_request(&req).unwrap();
		let decoded = decode_hg_request(&enc).unwrap();
		assert_eq!(decoded.k, Some(1));
	}

	#[test]
	fn get_subgraph_keeps_explicit_k() {
		let req = HGRequest::get_subgraph("a", Some(3));
		let enc = encode_hg_request(&req).unwrap();
		let decoded = decode_hg_request(&enc).unwrap();
		assert_eq!(decoded.k, Some(3));
	}

	#[test]
	fn remove_vertex_round_trip() {
		let req = HGRequest::remove_vertex("a");
		let enc = encode_hg_request(&req).unwrap();
		let decoded = decode_hg_request(&enc).unwrap();
		assert_eq!(decoded.vid, Some("a".to_string()));
		assert!(decoded.vertex.is_none() && decoded.hyperedge.is_none() && decoded.eid.is_none());
	}

	#[test]
	fn unsupported_op_rejected() {
		let req = HGRequest { op: 99, ..Default::default() };
		assert_eq!(encode_hg_request(&req), Err(Error::UnsupportedField("op")));
	}

	#[test]
	fn hg_response_round_trip() {
		let resp = HGResponse {
			ok: true,
			err: None,
			vertices: vec![Vertex::new("a").with_label("A")],
			edges: vec![Hyperedge::new("e1", vec!["a".into()]).with_weight(1)],
		};
		let enc = encode_hg_response(&resp);
		let decoded = decode_hg_response(&enc).unwrap();
		assert_eq!(decoded, resp);
	}

	#[test]
	fn hg_response_trailing_bytes_rejected() {
		let resp = HGResponse::default();
		let mut enc = encode_hg_response(&resp);
		enc.push(0xFF);
		assert_eq!(decode_hg_response(&enc), Err(Error::TrailingBytes));
	}
}
