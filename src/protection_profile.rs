//! RFC 3711 baseline crypto profiles.
//!
//! A `ProtectionProfile` names a cipher, an authenticator, and the lengths
//! that bind them together, the same way a TLS cipher suite does. The
//! master key (16 bytes) and master salt (14 bytes) lengths are the same
//! for every profile here; only the derived session-key and tag lengths
//! vary.

use crate::error::{Error, Result};

pub const MASTER_KEY_LEN: usize = 16;
pub const MASTER_SALT_LEN: usize = 14;

/// Supported RFC 3711 baseline protection profiles.
///
/// AEAD profiles (AES-GCM, RFC 7714) are out of scope for this engine; see
/// SPEC_FULL.md §1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ProtectionProfile {
    /// AES-128-ICM confidentiality + HMAC-SHA1, 80-bit tag. The RFC 3711
    /// mandatory-to-implement default.
    Aes128CmHmacSha1_80,
    /// AES-128-ICM confidentiality + HMAC-SHA1, 32-bit tag (SRTP only in
    /// RFC 3711, but the 80-bit SRTCP tag is retained for this profile per
    /// `crypto_policy_set_from_profile_for_rtcp`).
    Aes128CmHmacSha1_32,
    /// No confidentiality, HMAC-SHA1 integrity only, 80-bit tag.
    NullHmacSha1_80,
    /// AES-128-ICM confidentiality, no authentication. Not part of the
    /// RFC 3711 mandatory table; must be named explicitly by a caller.
    Aes128CmNullAuth,
}

use ProtectionProfile::*;

impl ProtectionProfile {
    /// Length, in bytes, of the derived session cipher key concatenated
    /// with its session salt (what the KDF produces for the `*_enc` +
    /// `*_salt` labels combined).
    pub fn cipher_key_plus_salt_len(&self) -> usize {
        match self {
            Aes128CmHmacSha1_80 | Aes128CmHmacSha1_32 | Aes128CmNullAuth => 30,
            NullHmacSha1_80 => 0,
        }
    }

    /// Length of the session cipher key alone (AES-128 key material).
    pub fn cipher_key_len(&self) -> usize {
        match self {
            Aes128CmHmacSha1_80 | Aes128CmHmacSha1_32 | Aes128CmNullAuth => 16,
            NullHmacSha1_80 => 0,
        }
    }

    /// Length of the session cipher salt.
    pub fn cipher_salt_len(&self) -> usize {
        match self {
            Aes128CmHmacSha1_80 | Aes128CmHmacSha1_32 | Aes128CmNullAuth => 14,
            NullHmacSha1_80 => 0,
        }
    }

    /// Length of the derived session authentication key.
    pub fn auth_key_len(&self) -> usize {
        match self {
            Aes128CmHmacSha1_80 | Aes128CmHmacSha1_32 | NullHmacSha1_80 => 20,
            Aes128CmNullAuth => 0,
        }
    }

    /// SRTP authentication tag length.
    pub fn rtp_auth_tag_len(&self) -> usize {
        match self {
            Aes128CmHmacSha1_80 | NullHmacSha1_80 => 10,
            Aes128CmHmacSha1_32 => 4,
            Aes128CmNullAuth => 0,
        }
    }

    /// SRTCP authentication tag length. SRTCP always uses the 80-bit tag
    /// for the `*_32` profile: `crypto_policy_set_from_profile_for_rtcp`
    /// maps `aes128_cm_sha1_32` to the 80-bit RTCP policy.
    pub fn rtcp_auth_tag_len(&self) -> usize {
        match self {
            Aes128CmHmacSha1_80 | Aes128CmHmacSha1_32 | NullHmacSha1_80 => 10,
            Aes128CmNullAuth => 0,
        }
    }

    pub fn is_null_cipher(&self) -> bool {
        matches!(self, NullHmacSha1_80)
    }

    pub fn is_null_auth(&self) -> bool {
        matches!(self, Aes128CmNullAuth)
    }

    /// Security services provided, for diagnostics and policy validation.
    pub fn confidentiality(&self) -> bool {
        !self.is_null_cipher()
    }

    pub fn authentication(&self) -> bool {
        !self.is_null_auth()
    }
}

impl std::fmt::Display for ProtectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Aes128CmHmacSha1_80 => "aes128_cm_sha1_80",
            Aes128CmHmacSha1_32 => "aes128_cm_sha1_32",
            NullHmacSha1_80 => "null_sha1_80",
            Aes128CmNullAuth => "aes128_cm_null_auth",
        };
        f.write_str(name)
    }
}

pub(crate) fn check_master_lengths(master_key: &[u8], master_salt: &[u8]) -> Result<()> {
    if master_key.len() != MASTER_KEY_LEN {
        return Err(Error::MasterKeyLength(MASTER_KEY_LEN, master_key.len()));
    }
    if master_salt.len() != MASTER_SALT_LEN {
        return Err(Error::MasterSaltLength(MASTER_SALT_LEN, master_salt.len()));
    }
    Ok(())
}
