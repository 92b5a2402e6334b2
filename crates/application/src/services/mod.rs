mod message_writer;

pub use message_writer::{Delivery, MessageWriter};
