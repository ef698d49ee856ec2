//! Revision preview tokens

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks the tokens that authorize a revision preview
///
/// A token is `hex(HMAC-SHA256(key, "revision:" revision_id))`. Without a key
/// every check fails, so previews stay off until a secret is configured.
#[derive(Clone)]
pub struct RevisionTokenSigner {
    key: Vec<u8>,
}

impl RevisionTokenSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    /// Whether a signing key is configured
    pub fn is_enabled(&self) -> bool {
        !self.key.is_empty()
    }

    /// Token for `revision_id`
    pub fn token(&self, revision_id: u64) -> String {
        match self.mac(revision_id) {
            Some(mac) => hex::encode(mac.finalize().into_bytes()),
            None => String::new(),
        }
    }

    /// Check `token` against `revision_id`
    ///
    /// The comparison runs in constant time inside `verify_slice`.
    pub fn verify(&self, revision_id: u64, token: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Ok(presented) = hex::decode(token.trim()) else {
            return false;
        };
        self.mac(revision_id)
            .is_some_and(|mac| mac.verify_slice(&presented).is_ok())
    }

    fn mac(&self, revision_id: u64) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(format!("revision:{}", revision_id).as_bytes());
        Some(mac)
    }
}

impl std::fmt::Debug for RevisionTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionTokenSigner")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
