//! Replay protection: one database per direction-sensitive index space.
//!
//! SRTP's index space is 48 bits (ROC || sequence number) and must be
//! *estimated* from a 16-bit wire sequence number, so its database
//! ([`rdbx`]) carries the extra ROC-disambiguation step. SRTCP's index is
//! transmitted in full (31 bits) so its database ([`rdb`]) only needs the
//! sliding-window check, no estimation.

pub(crate) mod rdb;
pub(crate) mod rdbx;
