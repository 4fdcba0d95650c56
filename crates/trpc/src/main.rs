// Copyright 2026 tritrpcv1 contributors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `trpc`: the command-line driver for packing and verifying `tritrpcv1`
//! frames (`spec` §6). `pack` builds an AEAD-bound frame from a JSON request
//! description; `verify` recomputes tags for a batch of named fixture
//! frames against a batch of named nonces and a zero key.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Deserialize;

use tritrpcv1::constants::{DEFAULT_MAX_FRAME_LEN, KEY_LEN, NONCE_LEN};
use tritrpcv1::payload::HGRequest;
use tritrpcv1::{aead, payload};

#[derive(Parser)]
#[command(name = "trpc", about = "Pack and verify tritrpcv1 frames", version)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Build an AEAD-bound frame from a JSON request and print it as hex.
	Pack {
		#[arg(long)]
		service: Option<String>,
		#[arg(long)]
		method: Option<String>,
		#[arg(long)]
		json: Option<PathBuf>,
		#[arg(long)]
		nonce: Option<String>,
		#[arg(long)]
		key: Option<String>,
	},
	/// Recompute tags for a fixtures file against a nonces file.
	Verify {
		#[arg(long)]
		fixtures: Option<PathBuf>,
		#[arg(long)]
		nonces: Option<PathBuf>,
	},
}

/// The driver's own failure modes, distinct from `tritrpcv1::Error`: usage
/// problems exit 1, frame verification/decode problems exit 2 (`spec` §6).
#[derive(Debug)]
enum CliError {
	Usage(String),
	Verify(String),
}

impl CliError {
	fn exit_code(&self) -> ExitCode {
		match self {
			CliError::Usage(_) => ExitCode::from(1),
			CliError::Verify(_) => ExitCode::from(2),
		}
	}
}

impl std::fmt::Display for CliError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CliError::Usage(msg) => write!(f, "{}", msg),
			CliError::Verify(msg) => write!(f, "{}", msg),
		}
	}
}

fn main() -> ExitCode {
	env_logger::init();
	let cli = Cli::parse();
	match run(cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			println!("{}", e);
			e.exit_code()
		}
	}
}

fn run(cli: Cli) -> Result<(), CliError> {
	match cli.command {
		Command::Pack { service, method, json, nonce, key } => pack(service, method, json, nonce, key),
		Command::Verify { fixtures, nonces } => verify(fixtures, nonces),
	}
}

fn require<T>(value: Option<T>, flag: &str) -> Result<T, CliError> {
	value.ok_or_else(|| CliError::Usage(format!("usage: trpc pack|verify ... ({} is required)", flag)))
}

fn decode_hex_exact<const N: usize>(s: &str, what: &str) -> Result<[u8; N], CliError> {
	let bytes = hex::decode(s).map_err(|e| CliError::Usage(format!("invalid {} hex: {}", what, e)))?;
	if bytes.len() != N {
		return Err(CliError::Usage(format!("{} must be {} bytes, got {}", what, N, bytes.len())));
	}
	let mut out = [0u8; N];
	out.copy_from_slice(&bytes);
	Ok(out)
}

fn pack(
	service: Option<String>,
	method: Option<String>,
	json: Option<PathBuf>,
	nonce: Option<String>,
	key: Option<String>,
) -> Result<(), CliError> {
	let service = require(service, "--service")?;
	let method = require(method, "--method")?;
	let json_path = require(json, "--json")?;
	let nonce_hex = require(nonce, "--nonce")?;
	let key_hex = require(key, "--key")?;

	let key: [u8; KEY_LEN] = decode_hex_exact(&key_hex, "--key")?;
	let nonce: [u8; NONCE_LEN] = decode_hex_exact(&nonce_hex, "--nonce")?;

	let json_bytes = fs::read(&json_path)
		.map_err(|e| CliError::Usage(format!("read error: {} ({})", e, json_path.display())))?;
	let req = build_from_json(&method, &json_bytes);
	let payload_bytes = payload::encode_hg_request(&req)
		.map_err(|e| CliError::Usage(format!("could not encode request: {}", e)))?;

	let frame = aead::build_sealed_frame(&service, &method, &payload_bytes, None, false, &key, &nonce)
		.map_err(|e| CliError::Usage(format!("could not seal frame: {}", e)))?;
	info!("packed {} bytes for {}/{}", frame.len(), service, method);
	println!("{}", hex::encode(frame));
	Ok(())
}

/// The JSON request shape accepted by `pack` (`spec` §6). On invalid or
/// partially-specified JSON this falls back to a canned
/// `AddVertex("a", "A")` request, mirroring the original driver's
/// ergonomics (`examples/original_source/go/tritrpcv1/cmd/trpc/main.go`).
/// This fallback is a CLI convenience, not part of the wire contract, so it
/// lives here rather than in the library.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct JsonRequest {
	#[serde(default)]
	op: String,
	#[serde(default)]
	vertex: Option<JsonVertex>,
	#[serde(default)]
	edge: Option<JsonEdge>,
	#[serde(default)]
	vid: String,
	#[serde(default)]
	eid: String,
	#[serde(default)]
	k: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonVertex {
	vid: String,
	#[serde(default)]
	label: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JsonEdge {
	eid: String,
	#[serde(default)]
	members: Vec<String>,
	#[serde(default)]
	weight: i64,
}

fn fallback_add_vertex() -> HGRequest {
	HGRequest::add_vertex("a", Some("A".to_string()))
}

fn build_from_json(method: &str, json_bytes: &[u8]) -> HGRequest {
	let req: JsonRequest = match serde_json::from_slice(json_bytes) {
		Ok(r) => r,
		Err(e) => {
			warn!("invalid request json for {}: {}; falling back to AddVertex(a, A)", method, e);
			return fallback_add_vertex();
		}
	};
	match req.op.as_str() {
		"AddVertex" => match req.vertex {
			Some(v) => HGRequest::add_vertex(v.vid, non_empty(v.label)),
			None => fallback_add_vertex(),
		},
		"AddHyperedge" => match req.edge {
			Some(e) => HGRequest::add_hyperedge(e.eid, e.members, Some(e.weight)),
			None => HGRequest::add_hyperedge("e1", vec!["a".to_string(), "b".to_string()], Some(1)),
		},
		"QueryNeighbors" => HGRequest::query_neighbors(req.vid, req.k),
		"RemoveVertex" => HGRequest::remove_vertex(req.vid),
		"RemoveHyperedge" => HGRequest::remove_hyperedge(req.eid),
		"GetSubgraph" => HGRequest::get_subgraph(req.vid, req.k),
		_ => fallback_add_vertex(),
	}
}

fn non_empty(s: String) -> Option<String> {
	if s.is_empty() {
		None
	} else {
		Some(s)
	}
}

fn verify(fixtures: Option<PathBuf>, nonces: Option<PathBuf>) -> Result<(), CliError> {
	let fixtures_path = require(fixtures, "--fixtures")?;
	let nonces_path = require(nonces, "--nonces")?;

	let fixture_pairs = read_name_hex_pairs(&fixtures_path)
		.map_err(|e| CliError::Usage(format!("read error: {} ({})", e, fixtures_path.display())))?;
	let nonce_map = read_name_hex_pairs(&nonces_path)
		.map_err(|e| CliError::Usage(format!("read error: {} ({})", e, nonces_path.display())))?
		.into_iter()
		.collect::<HashMap<_, _>>();

	let zero_key = [0u8; KEY_LEN];
	for (name, frame_hex) in &fixture_pairs {
		let frame = hex::decode(frame_hex)
			.map_err(|e| CliError::Verify(format!("decode error for {}: invalid hex ({})", name, e)))?;
		let env = tritrpcv1::envelope::parse_envelope_bounded(&frame, DEFAULT_MAX_FRAME_LEN)
			.map_err(|e| CliError::Verify(format!("decode error for {}: {}", name, e)))?;
		if !env.aead {
			continue;
		}
		let nonce_hex = nonce_map
			.get(name)
			.ok_or_else(|| CliError::Verify(format!("no nonce for {}", name)))?;
		let nonce: [u8; NONCE_LEN] = decode_hex_exact(nonce_hex, "nonce")
			.map_err(|e| CliError::Verify(format!("aad error for {}: {}", name, e)))?;
		aead::parse_and_verify_bounded(&frame, DEFAULT_MAX_FRAME_LEN, &zero_key, &nonce)
			.map_err(|_| CliError::Verify(format!("tag mismatch for {}", name)))?;
	}
	println!("OK: {}", fixtures_path.display());
	Ok(())
}

/// Reads `name hex` lines, skipping blank lines and `#` comments, as both
/// the fixtures and nonces files use (`spec` §6).
fn read_name_hex_pairs(path: &PathBuf) -> std::io::Result<Vec<(String, String)>> {
	let content = fs::read_to_string(path)?;
	let mut out = Vec::new();
	for line in content.lines() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		if let Some((name, hex)) = line.split_once(' ') {
			out.push((name.to_string(), hex.trim().to_string()));
		}
	}
	Ok(out)
}
