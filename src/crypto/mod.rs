//! Crypto-primitive capability sets (SPEC_FULL.md §4.1).
//!
//! A [`Cipher`] is a keystream generator: it is keyed once, given a fresh
//! IV per packet, and then either emits raw keystream bytes or XORs
//! keystream into a buffer in place. An [`Authenticator`] is a keyed MAC
//! with an optional keystream-prefix output, for universal-hash MACs that
//! need one (none of the profiles this engine implements do, but the
//! capability is part of the interface per RFC 3711 §4.2).
//!
//! These are kept as two small traits rather than one combined
//! "cipher-suite" trait per profile (contrast the grounding crate's
//! `Cipher`, which bundles both) so that `null_sha1_80` — NULL cipher +
//! real HMAC-SHA1 — is just "pick a `Cipher` impl and an `Authenticator`
//! impl", not a bespoke third type.

pub mod auth_hmac_sha1;
pub mod auth_null;
pub mod cipher_aes_icm;
pub mod cipher_null;

use crate::error::Result;

/// A 128-bit IV, formed per SPEC_FULL.md §6 "IV formation".
pub type Iv = [u8; 16];

/// Keystream generator / in-place XOR cipher.
pub trait Cipher: Send {
    /// Establish the IV for the next packet. Must be called before
    /// `output`/`encrypt`.
    fn set_iv(&mut self, iv: &Iv);

    /// Emit `buf.len()` bytes of keystream, advancing the internal
    /// counter. Used to produce a prefix for universal-hash MACs.
    fn output(&mut self, buf: &mut [u8]);

    /// XOR keystream into `buf` in place, advancing the internal counter
    /// by `buf.len()` bytes. The NULL cipher is a no-op.
    fn encrypt_in_place(&mut self, buf: &mut [u8]);

    /// Cipher session key length, for diagnostics.
    fn key_length(&self) -> usize;

    /// `true` for AES-ICM ciphers, whose IV formation differs from other
    /// ciphers (SPEC_FULL.md §4.7 step 8). There is only one cipher family
    /// implemented here, but the predicate documents the dispatch point a
    /// second cipher family would need.
    fn is_aes_icm(&self) -> bool;
}

/// Keyed message-authentication capability.
pub trait Authenticator: Send {
    /// Reset per-packet state (start a new MAC computation).
    fn start(&mut self);

    /// Feed packet bytes into the running MAC.
    fn update(&mut self, data: &[u8]);

    /// Finalize, mixing in `extra` (the big-endian ROC, for SRTP) after
    /// `data`, and return the full-length tag. Callers truncate to
    /// `tag_length()`.
    fn compute(&mut self, extra: &[u8]) -> Vec<u8>;

    /// Authentication key length, for diagnostics.
    fn key_length(&self) -> usize;

    /// Tag length this authenticator is configured to emit (may be less
    /// than the underlying MAC's native output length — e.g. HMAC-SHA1
    /// truncated to 32 bits).
    fn tag_length(&self) -> usize;

    /// Keystream-prefix length required before running the MAC. Zero for
    /// HMAC-SHA1 and the NULL authenticator; nonzero only for
    /// universal-hash MACs (TMMHv2), which this engine does not implement
    /// but the interface accommodates per SPEC_FULL.md §4.1.
    fn prefix_length(&self) -> usize {
        0
    }
}

/// Verify `tag` against the first `tag.len()` bytes of `computed` in
/// constant time. `false` means the comparison failed (MAC mismatch).
pub(crate) fn tags_equal(computed: &[u8], tag: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    computed.len() >= tag.len() && computed[..tag.len()].ct_eq(tag).unwrap_u8() == 1
}

/// Form the 128-bit AES-ICM IV for an SRTP packet (SPEC_FULL.md §6 "IV
/// formation"): four 32-bit big-endian words `[0, SSRC, EST>>16,
/// EST<<16]`, where `est` is the 48-bit estimated extended packet index.
/// For non-AES-ICM ciphers the source places the index alone in the low
/// 64 bits; there is only one confidentiality cipher family implemented
/// here (AES-ICM), but the branch documents the dispatch point a second
/// cipher family would need.
pub(crate) fn form_rtp_iv(is_aes_icm: bool, ssrc: u32, est: u64) -> Iv {
    use byteorder::{BigEndian, ByteOrder};
    let mut iv = [0u8; 16];
    if is_aes_icm {
        BigEndian::write_u32(&mut iv[4..8], ssrc);
        BigEndian::write_u32(&mut iv[8..12], (est >> 16) as u32);
        BigEndian::write_u32(&mut iv[12..16], (est << 16) as u32);
    } else {
        BigEndian::write_u64(&mut iv[8..16], est);
    }
    iv
}

/// Form the 128-bit AES-ICM IV for an SRTCP packet: `[0, SSRC, IDX>>16,
/// IDX<<16]`, where `idx` is the 31-bit SRTCP index.
pub(crate) fn form_rtcp_iv(is_aes_icm: bool, ssrc: u32, idx: u32) -> Iv {
    use byteorder::{BigEndian, ByteOrder};
    let mut iv = [0u8; 16];
    if is_aes_icm {
        BigEndian::write_u32(&mut iv[4..8], ssrc);
        BigEndian::write_u32(&mut iv[8..12], idx >> 16);
        BigEndian::write_u32(&mut iv[12..16], idx << 16);
    } else {
        BigEndian::write_u32(&mut iv[12..16], idx);
    }
    iv
}

/// One stream's crypto material (RTP or RTCP side): cipher + authenticator,
/// built once and shared (via `Rc`) between a template and every stream
/// cloned from it (SPEC_FULL.md §4.9). The `RefCell`s give the shared
/// handle the same per-packet mutability (`set_iv`, counter advance) a
/// sole owner would have; a session is single-threaded and non-reentrant
/// (SPEC_FULL.md §5), so there is no concurrent-borrow hazard.
pub(crate) struct CryptoSuite {
    pub cipher: std::cell::RefCell<Box<dyn Cipher>>,
    pub auth: std::cell::RefCell<Box<dyn Authenticator>>,
}

impl CryptoSuite {
    pub fn new(cipher: Box<dyn Cipher>, auth: Box<dyn Authenticator>) -> Self {
        CryptoSuite {
            cipher: std::cell::RefCell::new(cipher),
            auth: std::cell::RefCell::new(auth),
        }
    }
}

pub(crate) fn new_cipher(
    profile: crate::protection_profile::ProtectionProfile,
    session_key_and_salt: &[u8],
) -> Result<Box<dyn Cipher>> {
    if profile.is_null_cipher() {
        Ok(Box::new(cipher_null::NullCipher::new()))
    } else {
        Ok(Box::new(cipher_aes_icm::CipherAesIcm::new(
            session_key_and_salt,
        )?))
    }
}

pub(crate) fn new_authenticator(
    profile: crate::protection_profile::ProtectionProfile,
    session_auth_key: &[u8],
    rtp_tag_len: usize,
) -> Result<Box<dyn Authenticator>> {
    if profile.is_null_auth() {
        Ok(Box::new(auth_null::NullAuthenticator::new()))
    } else {
        Ok(Box::new(auth_hmac_sha1::AuthHmacSha1::new(
            session_auth_key,
            rtp_tag_len,
        )?))
    }
}
