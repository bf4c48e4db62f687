//! SRTP protect/unprotect data paths (SPEC_FULL.md §4.7, §4.8).
//!
//! Grounded on the teacher's `context/srtp.rs` (`decrypt_rtp`/
//! `encrypt_rtp`, header parsing via `rtp::header::Header::unmarshal`)
//! and on `srtp.c`'s `asrtpa_protect`/`asrtpa_unprotect` for the exact
//! step order. Unlike the teacher, this operates in place on a caller-
//! owned `Vec<u8>` (growing it for the tag, truncating it on unprotect)
//! rather than allocating a fresh `Bytes` per call, per SPEC_FULL.md §9's
//! explicit redesign note.

use byteorder::{BigEndian, ByteOrder};
use util::marshal::{MarshalSize, Unmarshal};

use super::Session;
use crate::crypto::{form_rtp_iv, tags_equal, Authenticator, Cipher};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::key_limit::KeyEvent;
use crate::stream::Stream;

const RTP_MIN_HEADER_LEN: usize = 12;

impl Session {
    /// Encrypt and/or authenticate an RTP packet in place, appending the
    /// authentication tag. `buf` must have at least `tag_len` bytes of
    /// spare capacity beyond its current length (SPEC_FULL.md §9's
    /// `capacity_hint`/`BufferTooSmall` precondition) — callers that
    /// build packets with `rtp::packet::Packet::marshal` should reserve
    /// `ProtectionProfile::rtp_auth_tag_len()` extra bytes up front.
    pub fn protect(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        if buf.len() < RTP_MIN_HEADER_LEN {
            return Err(Error::TooShortRtp(buf.len(), RTP_MIN_HEADER_LEN));
        }

        let mut cursor = &buf[..];
        let header = rtp::header::Header::unmarshal(&mut cursor)?;
        let ssrc = header.ssrc;
        let header_len = header.marshal_size();

        self.resolve_for_protect(ssrc)?;
        self.check_sender_direction(ssrc);

        let tag_len = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            stream.rtp_tag_len
        };
        let trailing = buf.capacity() - buf.len();
        if trailing < tag_len {
            return Err(Error::BufferTooSmall(trailing, tag_len));
        }

        let key_event = {
            let stream = self.streams.get_mut(&ssrc).expect("resolved above");
            stream.limit.borrow_mut().update()
        };
        match key_event {
            KeyEvent::HardLimit => {
                log::warn!("srtp: key hard limit reached for ssrc {ssrc:08x}");
                self.fire_event(ssrc, Event::KeyHardLimit);
                return Err(Error::KeyExpired);
            }
            KeyEvent::SoftLimit => {
                log::debug!("srtp: key soft limit reached for ssrc {ssrc:08x}");
                self.fire_event(ssrc, Event::KeySoftLimit);
            }
            KeyEvent::Normal => {}
        }

        let stream = self.streams.get_mut(&ssrc).expect("resolved above");

        let (delta, est) = stream.rtp_rdbx.estimate_index(header.sequence_number);
        stream.rtp_rdbx.check(delta)?;

        let is_aes_icm = stream.rtp.cipher.borrow().is_aes_icm();
        let iv = form_rtp_iv(is_aes_icm, ssrc, est);
        stream.rtp.cipher.borrow_mut().set_iv(&iv);

        let prefix_len = stream.rtp.auth.borrow().prefix_length();
        if prefix_len > 0 {
            let mut prefix = vec![0u8; prefix_len];
            stream.rtp.cipher.borrow_mut().output(&mut prefix);
        }

        if stream.rtp_services.confidentiality {
            stream
                .rtp
                .cipher
                .borrow_mut()
                .encrypt_in_place(&mut buf[header_len..]);
        }

        let tag = if stream.rtp_services.authentication {
            let mut roc_be = [0u8; 4];
            BigEndian::write_u32(&mut roc_be, (est >> 16) as u32);
            let mut auth = stream.rtp.auth.borrow_mut();
            auth.start();
            auth.update(buf.as_slice());
            Some(auth.compute(&roc_be))
        } else {
            None
        };

        // Commit the replay-window advance only now that encryption and
        // the tag computation have both succeeded.
        stream.rtp_rdbx.add_index(delta);

        if let Some(tag) = tag {
            buf.extend_from_slice(&tag[..tag_len]);
        }

        Ok(())
    }

    /// Verify and decrypt an SRTP packet in place, stripping the
    /// authentication tag on success. The packet buffer is left
    /// unmodified on any error (SPEC_FULL.md §7: a failed unprotect must
    /// not poison replay state or partially decrypt the buffer).
    pub fn unprotect(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        if buf.len() < RTP_MIN_HEADER_LEN {
            return Err(Error::TooShortRtp(buf.len(), RTP_MIN_HEADER_LEN));
        }

        let mut cursor = &buf[..];
        let header = rtp::header::Header::unmarshal(&mut cursor)?;
        let ssrc = header.ssrc;
        let header_len = header.marshal_size();

        let existed = self.streams.contains_key(&ssrc);
        let mut provisional = if existed {
            None
        } else {
            let template = self.template.as_ref().ok_or(Error::NoCtx(ssrc))?;
            Some(Stream::clone_from_template(template, ssrc))
        };

        // Work against whichever stream is in play — the concrete one if
        // it already exists, or the not-yet-committed provisional clone
        // (SPEC_FULL.md §4.8 step 2). `prov_ref` never aliases
        // `self.streams`, so this sidesteps the borrow-checker conflict
        // the enum-based "provisional handle" design in SPEC_FULL.md §9
        // would otherwise hit.
        macro_rules! with_stream {
            (|$s:ident| $body:expr) => {
                if let Some($s) = provisional.as_mut() {
                    $body
                } else {
                    let $s = self.streams.get_mut(&ssrc).expect("existed checked above");
                    $body
                }
            };
        }

        let tag_len = with_stream!(|s| s.rtp_tag_len);
        if buf.len() < header_len + tag_len {
            return Err(Error::TooShortRtp(buf.len(), header_len + tag_len));
        }
        let ciphertext_len = buf.len() - tag_len;

        let (delta, est) = with_stream!(|s| s.rtp_rdbx.estimate_index(header.sequence_number));
        with_stream!(|s| s.rtp_rdbx.check(delta))?;

        let is_aes_icm = with_stream!(|s| s.rtp.cipher.borrow().is_aes_icm());
        let iv = form_rtp_iv(is_aes_icm, ssrc, est);
        with_stream!(|s| s.rtp.cipher.borrow_mut().set_iv(&iv));

        let prefix_len = with_stream!(|s| s.rtp.auth.borrow().prefix_length());
        if prefix_len > 0 {
            let mut prefix = vec![0u8; prefix_len];
            with_stream!(|s| s.rtp.cipher.borrow_mut().output(&mut prefix));
        }

        let authentication_on = with_stream!(|s| s.rtp_services.authentication);
        if authentication_on {
            let mut roc_be = [0u8; 4];
            BigEndian::write_u32(&mut roc_be, (est >> 16) as u32);
            let computed = with_stream!(|s| {
                let mut auth = s.rtp.auth.borrow_mut();
                auth.start();
                auth.update(&buf[..ciphertext_len]);
                auth.compute(&roc_be)
            });
            if !tags_equal(&computed, &buf[ciphertext_len..ciphertext_len + tag_len]) {
                return Err(Error::AuthFail);
            }
        }

        // Key-limit accounting only happens once authentication has
        // passed (SPEC_FULL.md §4.8 step 8).
        let key_event = with_stream!(|s| s.limit.borrow_mut().update());
        match key_event {
            KeyEvent::HardLimit => {
                log::warn!("srtp: key hard limit reached for ssrc {ssrc:08x}");
                self.fire_event(ssrc, Event::KeyHardLimit);
                return Err(Error::KeyExpired);
            }
            KeyEvent::SoftLimit => {
                log::debug!("srtp: key soft limit reached for ssrc {ssrc:08x}");
                self.fire_event(ssrc, Event::KeySoftLimit);
            }
            KeyEvent::Normal => {}
        }

        let confidentiality_on = with_stream!(|s| s.rtp_services.confidentiality);
        if confidentiality_on {
            with_stream!(|s| s
                .rtp
                .cipher
                .borrow_mut()
                .encrypt_in_place(&mut buf[header_len..ciphertext_len]));
        }

        if let Some(stream) = provisional.take() {
            log::debug!("srtp: materialized stream for ssrc {ssrc:08x} from inbound template");
            self.streams.insert(ssrc, stream);
        }
        self.check_receiver_direction(ssrc);

        {
            let stream = self.streams.get_mut(&ssrc).expect("committed above");
            stream.rtp_rdbx.add_index(delta);
        }

        buf.truncate(ciphertext_len);
        Ok(())
    }
}
