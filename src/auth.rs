/*!
Message authentication, TSIG-shaped: a keyed-hash signature covering
a query/response pair, verified before the query is answered and
attached to the response. The wire TSIG pseudo-record itself belongs
to the message layer; this module only computes and checks the MAC.
*/

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unknown key name")]
    UnknownKey,
    #[error("signature does not match")]
    BadSignature,
}

/// A shared secret identified by name, as configured per key.
pub struct AuthKey {
    pub name: String,
    secret: Vec<u8>,
}

impl AuthKey {
    pub fn new(name: impl Into<String>, secret: Vec<u8>) -> Self {
        AuthKey { name: name.into(), secret }
    }
}

/// Computes and verifies message MACs against a small set of
/// configured keys. Named after, but independent from, TSIG's wire
/// encoding: `sign`/`verify` operate purely on byte slices.
pub struct MessageAuthenticator {
    keys: Vec<AuthKey>,
}

impl MessageAuthenticator {
    pub fn new(keys: Vec<AuthKey>) -> Self {
        MessageAuthenticator { keys }
    }

    fn find(&self, key_name: &str) -> Option<&AuthKey> {
        self.keys.iter().find(|k| k.name == key_name)
    }

    pub fn sign(&self, key_name: &str, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        let key = self.find(key_name).ok_or(AuthError::UnknownKey)?;
        let mut mac = HmacSha256::new_from_slice(&key.secret).expect("HMAC accepts any key length");
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    pub fn verify(&self, key_name: &str, message: &[u8], mac_bytes: &[u8]) -> Result<(), AuthError> {
        let key = self.find(key_name).ok_or(AuthError::UnknownKey)?;
        let mut mac = HmacSha256::new_from_slice(&key.secret).expect("HMAC accepts any key length");
        mac.update(message);
        mac.verify_slice(mac_bytes).map_err(|_| AuthError::BadSignature)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
