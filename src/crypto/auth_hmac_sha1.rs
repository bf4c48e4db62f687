//! HMAC-SHA1 message authentication, truncated to the profile's tag length.
//!
//! Grounded on the teacher's `generate_srtp_auth_tag`/`generate_srtcp_auth_tag`
//! (`cipher/cipher_aes_cm_hmac_sha1/mod.rs`): both SRTP and SRTCP run the same
//! HMAC over the packet bytes followed by a 4-byte big-endian extra word (the
//! ROC for SRTP, nothing extra for SRTCP since the index is already part of
//! the trailer being authenticated), then truncate the 20-byte native output.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::Authenticator;
use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

pub(crate) struct AuthHmacSha1 {
    key: Vec<u8>,
    mac: HmacSha1,
    tag_len: usize,
}

impl AuthHmacSha1 {
    pub fn new(session_auth_key: &[u8], tag_len: usize) -> Result<Self> {
        let mac = HmacSha1::new_from_slice(session_auth_key)
            .map_err(|_| Error::Other("invalid HMAC-SHA1 key length".into()))?;
        Ok(AuthHmacSha1 {
            key: session_auth_key.to_vec(),
            mac,
            tag_len,
        })
    }
}

impl Authenticator for AuthHmacSha1 {
    fn start(&mut self) {
        // HmacSha1::new_from_slice with a key already validated in `new`
        // cannot fail here.
        self.mac = HmacSha1::new_from_slice(&self.key).expect("key length already validated");
    }

    fn update(&mut self, data: &[u8]) {
        self.mac.update(data);
    }

    fn compute(&mut self, extra: &[u8]) -> Vec<u8> {
        self.mac.update(extra);
        self.mac.clone().finalize().into_bytes().to_vec()
    }

    fn key_length(&self) -> usize {
        self.key.len()
    }

    fn tag_length(&self) -> usize {
        self.tag_len
    }
}
