//! Transceiver contract.
//!
//! The wire framing below the control channel is not part of this library.
//! The host provides an implementation backed by its own message pool; the
//! command layer only allocates, sends and releases frames. For every sent
//! frame the host must report the transmission status exactly once through
//! the facade's Tx-status entry point, handing the frame back for release.

use crate::telegram::Telegram;

/// Host-provided access to the control channel.
pub trait Transceiver {
    /// Returns a frame with at least `payload_len` bytes of payload, or
    /// `None` when the pool is exhausted.
    fn alloc_tx(&mut self, payload_len: u8) -> Option<Telegram>;

    /// Hands a composed frame to the wire. The transmission status is
    /// reported asynchronously.
    fn send(&mut self, tel: Telegram);

    /// Returns a frame to the pool.
    fn release(&mut self, tel: Telegram);
}
