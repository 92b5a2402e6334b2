//! WireDNS Application Layer
//!
//! The `Handler` port servers dispatch to, the `ReplySink` port transports
//! implement, the per-query `MessageWriter` and the static answer table.
pub mod ports;
pub mod services;
pub mod use_cases;

pub use ports::{handler_fn, Handler, HandlerFn, ReplySink};
pub use services::{Delivery, MessageWriter};
pub use use_cases::AnswerTable;
