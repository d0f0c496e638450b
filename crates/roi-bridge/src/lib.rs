//! Forwards region-of-interest rectangles to an external classification
//! server as `ROI <x> <y> <w> <h>\n` and returns its single-line answer.

mod async_client;
mod client;
pub mod config;
mod error;
pub mod protocol;

pub use async_client::AsyncRoiClient;
pub use client::RoiClient;
pub use config::{Config, ResponseMode};
pub use error::{ConfigError, ForwardError};
pub use protocol::{decode_response, ProtocolError, Roi, MAX_RESPONSE_LEN};
