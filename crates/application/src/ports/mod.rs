mod handler;
mod reply_sink;

pub use handler::{handler_fn, Handler, HandlerFn};
pub use reply_sink::ReplySink;
