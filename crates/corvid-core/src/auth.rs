// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication header construction for collector requests.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Builds the `X-Corvid-Auth` header value for one transmission.
///
/// The signature is an HMAC-SHA256 of the millisecond timestamp keyed by
/// the secret key, hex encoded; public-only descriptors omit it.
pub fn auth_header(timestamp_ms: i64, public_key: &str, secret_key: Option<&str>) -> String {
	let mut header = format!(
		"Corvid corvid_version=1, corvid_timestamp={timestamp_ms}, corvid_key={public_key}"
	);
	if let Some(secret) = secret_key {
		header.push_str(&format!(
			", corvid_signature={}",
			sign(timestamp_ms, secret)
		));
	}
	header
}

fn sign(timestamp_ms: i64, secret: &str) -> String {
	let mut mac =
		HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
	mac.update(timestamp_ms.to_string().as_bytes());
	hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_without_secret_has_no_signature() {
		let header = auth_header(1700000000000, "pub", None);
		assert_eq!(
			header,
			"Corvid corvid_version=1, corvid_timestamp=1700000000000, corvid_key=pub"
		);
	}

	#[test]
	fn header_with_secret_appends_hex_signature() {
		let header = auth_header(1700000000000, "pub", Some("sec"));
		let signature = header.rsplit("corvid_signature=").next().unwrap();
		assert_eq!(signature.len(), 64);
		assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn signature_is_deterministic_per_timestamp_and_secret() {
		assert_eq!(sign(1, "sec"), sign(1, "sec"));
		assert_ne!(sign(1, "sec"), sign(2, "sec"));
		assert_ne!(sign(1, "sec"), sign(1, "other"));
	}
}
