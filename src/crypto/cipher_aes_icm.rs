//! AES-128 in integer counter mode ("ICM"/CTR), the SRTP default cipher.
//!
//! Grounded on the teacher's `cipher/cipher_aes_cm_hmac_sha1/ctrcipher.rs`
//! counter-mode usage, split down to the cipher-only half: this type owns
//! just the session key + salt and the keystream generator, with no
//! embedded authenticator (see `crypto::mod` for why the split).

use aes::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use aes::Aes128;
use ctr::Ctr128BE;

use super::{Cipher, Iv};
use crate::error::{Error, Result};

type Aes128Ctr = Ctr128BE<Aes128>;

const AES_KEY_LEN: usize = 16;
const SALT_LEN: usize = 14;

pub(crate) struct CipherAesIcm {
    key: [u8; AES_KEY_LEN],
    salt: [u8; SALT_LEN],
    stream: Option<Aes128Ctr>,
}

impl CipherAesIcm {
    /// `session_key_and_salt` is the KDF output for one direction: 16
    /// bytes of AES key followed by 14 bytes of session salt.
    pub fn new(session_key_and_salt: &[u8]) -> Result<Self> {
        if session_key_and_salt.len() != AES_KEY_LEN + SALT_LEN {
            return Err(Error::Other(format!(
                "AES-128-ICM requires a {}-byte key+salt, got {}",
                AES_KEY_LEN + SALT_LEN,
                session_key_and_salt.len()
            )));
        }
        let mut key = [0u8; AES_KEY_LEN];
        let mut salt = [0u8; SALT_LEN];
        key.copy_from_slice(&session_key_and_salt[..AES_KEY_LEN]);
        salt.copy_from_slice(&session_key_and_salt[AES_KEY_LEN..]);

        Ok(CipherAesIcm {
            key,
            salt,
            stream: None,
        })
    }
}

impl Cipher for CipherAesIcm {
    fn set_iv(&mut self, iv: &Iv) {
        // The salt occupies the low 14 bytes of the 16-byte IV block; XOR
        // it in per RFC 3711 §4.1.1 to form the final AES-ICM counter.
        let mut counter = *iv;
        for (i, s) in self.salt.iter().enumerate() {
            counter[i] ^= s;
        }
        self.stream = Some(Aes128Ctr::new((&self.key).into(), (&counter).into()));
    }

    fn output(&mut self, buf: &mut [u8]) {
        buf.iter_mut().for_each(|b| *b = 0);
        if let Some(stream) = &mut self.stream {
            stream.apply_keystream(buf);
        }
    }

    fn encrypt_in_place(&mut self, buf: &mut [u8]) {
        if let Some(stream) = &mut self.stream {
            stream.apply_keystream(buf);
        }
    }

    fn key_length(&self) -> usize {
        AES_KEY_LEN
    }

    fn is_aes_icm(&self) -> bool {
        true
    }
}

impl CipherAesIcm {
    /// Rewind the keystream counter to the start of the current IV. Used
    /// when a keystream prefix has already been emitted for a
    /// universal-hash MAC and the encryption pass must restart from
    /// offset zero (not needed by HMAC-SHA1, kept for interface parity
    /// with the teacher's `stream.seek(0)` calls).
    #[allow(dead_code)]
    pub fn rewind(&mut self) {
        if let Some(stream) = &mut self.stream {
            stream.seek(0u32);
        }
    }
}
