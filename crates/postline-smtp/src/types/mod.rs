//! Core SMTP types.

mod address;
mod reply;

pub use address::Address;
pub use reply::{Reply, ReplyClass, ReplyCode};
