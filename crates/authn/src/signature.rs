//! Request signature computation and comparison.
//!
//! A request proves possession of the application secret by sending
//!
//! ```text
//! sign = hex(digest(app_key + "$" + app_secret + "$" + timestamp))
//! ```
//!
//! The timestamp is hashed exactly as the client sent it, so the signature
//! binds the raw header value, not its parsed form.
//!
//! # Compatibility
//!
//! The digest is a wire-compatibility boundary. Existing clients sign with
//! MD5, which is why [`SignatureDigest::Md5`] is the default. MD5 is
//! collision-broken; deployments that do not need to accept those clients
//! should configure [`SignatureDigest::Sha256`]. Switching digests
//! invalidates every signature produced under the other one.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Separator between the signed fields.
pub const SIGNATURE_SEPARATOR: char = '$';

/// Digest used to compute request signatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureDigest {
    /// MD5, 32 hex characters. Required for existing signed clients.
    #[default]
    Md5,
    /// SHA-256, 64 hex characters.
    Sha256,
}

impl SignatureDigest {
    /// Length of the lowercase hex signature this digest produces.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }

    fn hex_digest(self, input: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(input)),
            Self::Sha256 => hex::encode(Sha256::digest(input)),
        }
    }
}

/// Computes the expected lowercase hex signature for a request.
///
/// # Examples
///
/// ```
/// use dfs_common_authn::signature::{SignatureDigest, compute_signature};
///
/// let sign = compute_signature(SignatureDigest::Md5, "app1", "s3cr3t", "1700000000");
/// assert_eq!(sign, "b37039718d6a29c2b570bd4bc3ef8a7e");
/// ```
#[must_use]
pub fn compute_signature(
    digest: SignatureDigest,
    app_key: &str,
    app_secret: &str,
    timestamp: &str,
) -> String {
    // Sized up front so the buffer holding the secret is never reallocated,
    // and wrapped so it is scrubbed on drop.
    let mut payload = Zeroizing::new(String::with_capacity(
        app_key.len() + app_secret.len() + timestamp.len() + 2,
    ));
    payload.push_str(app_key);
    payload.push(SIGNATURE_SEPARATOR);
    payload.push_str(app_secret);
    payload.push(SIGNATURE_SEPARATOR);
    payload.push_str(timestamp);

    digest.hex_digest(payload.as_bytes())
}

/// Compares a claimed signature against the expected lowercase hex digest.
///
/// Hex case is ignored. The byte comparison runs in constant time; only the
/// length difference short-circuits.
#[must_use]
pub fn signatures_match(claimed: &str, expected: &str) -> bool {
    if claimed.len() != expected.len() {
        return false;
    }
    let claimed = claimed.to_ascii_lowercase();
    claimed.as_bytes().ct_eq(expected.as_bytes()).into()
}
