//! Request/response engine towards the companion network controller.
//!
//! Contains the telegram envelope, the transceiver contract, the function
//! dispatch table and the full remote command layer, plus the network
//! status/configuration cache fed by unsolicited status telegrams. Every
//! command follows one template: acquire the method's API-lock bit, obtain
//! a transmit buffer, compose the telegram, remember the requester on the
//! method's single-subject, send. The response path releases the lock and
//! delivers the decoded result.

#![cfg_attr(not(test), no_std)]

pub mod dec;
pub mod inic;
pub mod inic_res;
pub mod net;
pub mod notice;
pub mod telegram;
pub mod trcv;

#[cfg(test)]
mod inic_tests;

pub use inic::{DeviceStatus, DeviceVersion, Inic};
pub use net::{IsOwnAddr, NetworkManagement};
pub use notice::{Notice, NoticeData, Notices, SubData};
pub use telegram::{TEL_MAX_PAYLOAD, Telegram, decode_u16, decode_u32, hb, lb};
pub use trcv::Transceiver;
