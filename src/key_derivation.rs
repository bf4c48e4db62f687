//! RFC 3711 §4.3 key derivation function.
//!
//! The KDF always runs AES-128 in integer counter mode keyed by the master
//! key, independent of the data-plane cipher a profile selects — even the
//! NULL-cipher profile derives its authentication key this way.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

pub const LABEL_RTP_ENCRYPTION: u8 = 0x00;
pub const LABEL_RTP_AUTHENTICATION: u8 = 0x01;
pub const LABEL_RTP_SALT: u8 = 0x02;
pub const LABEL_RTCP_ENCRYPTION: u8 = 0x03;
pub const LABEL_RTCP_AUTHENTICATION: u8 = 0x04;
pub const LABEL_RTCP_SALT: u8 = 0x05;

/// Derive `out_len` bytes of key material for `label` from `master_key`/
/// `master_salt`, per RFC 3711 §4.3.1 (Appendix B.3 of the document
/// describes the AES-CM instantiation of the PRF used here).
///
/// The nonce is formed as 16 zero bytes with byte 7 set to `label`, then
/// XORed with the (zero-padded) master salt — identical to forming an
/// AES-ICM IV and emitting keystream, because the KDF *is* AES-ICM keyed by
/// the master key.
pub(crate) fn derive(
    label: u8,
    master_key: &[u8],
    master_salt: &[u8],
    out_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if master_key.len() != 16 {
        return Err(Error::Other(format!(
            "key derivation requires a 16-byte AES-128 master key, got {}",
            master_key.len()
        )));
    }

    let key = GenericArray::from_slice(master_key);
    let cipher = Aes128::new(key);

    // The PRF input block is the zero-padded master salt with the label
    // XORed into byte 7, then re-XORed with an incrementing big-endian
    // counter over the low two bytes for each successive 16-byte block
    // (RFC 3711 Appendix B.3: "PRF_n(x) = AES_CTR(k, IV, n)" style
    // construction) so derivations longer than one AES block are
    // well-defined.
    let mut nonce = Zeroizing::new([0u8; 16]);
    nonce[..master_salt.len()].copy_from_slice(master_salt);
    nonce[7] ^= label;

    let mut out = Zeroizing::new(vec![0u8; out_len.div_ceil(16) * 16]);
    for (i, chunk) in out.chunks_mut(16).enumerate() {
        let mut block = *nonce;
        let counter = i as u16;
        block[14] ^= (counter >> 8) as u8;
        block[15] ^= counter as u8;

        let mut block = GenericArray::from(block);
        cipher.encrypt_block(&mut block);
        chunk.copy_from_slice(&block);
    }
    out.truncate(out_len);

    Ok(Zeroizing::new(out.to_vec()))
}

/// Derive the SRTP/SRTCP session cipher key (+ salt, for AES-ICM profiles)
/// and authentication key for one direction (`rtp` or `rtcp` labels),
/// zeroizing all intermediate buffers on drop (`asrtpa_stream_init_keys` /
/// `asrtpa_kdf_clear` in the original source).
pub(crate) struct DerivedKeys {
    /// Session cipher key concatenated with session cipher salt, the shape
    /// `ProtectionProfile::cipher_key_plus_salt_len` describes. Empty for
    /// the NULL cipher.
    pub cipher_key_and_salt: Zeroizing<Vec<u8>>,
    /// Session authentication key. Empty for the NULL authenticator.
    pub auth_key: Zeroizing<Vec<u8>>,
}

pub(crate) fn derive_session_keys(
    master_key: &[u8],
    master_salt: &[u8],
    enc_label: u8,
    salt_label: u8,
    auth_label: u8,
    cipher_key_len: usize,
    cipher_salt_len: usize,
    auth_key_len: usize,
) -> Result<DerivedKeys> {
    let mut cipher_key_and_salt = Zeroizing::new(Vec::with_capacity(cipher_key_len + cipher_salt_len));
    if cipher_key_len > 0 {
        let key = derive(enc_label, master_key, master_salt, cipher_key_len)?;
        cipher_key_and_salt.extend_from_slice(&key);
    }
    if cipher_salt_len > 0 {
        let salt = derive(salt_label, master_key, master_salt, cipher_salt_len)?;
        cipher_key_and_salt.extend_from_slice(&salt);
    }

    let auth_key = if auth_key_len > 0 {
        derive(auth_label, master_key, master_salt, auth_key_len)?
    } else {
        Zeroizing::new(Vec::new())
    };

    Ok(DerivedKeys {
        cipher_key_and_salt,
        auth_key,
    })
}
