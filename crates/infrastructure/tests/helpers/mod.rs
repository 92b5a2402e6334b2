#![allow(dead_code)]
#![allow(unused_imports)]

mod certs;
mod test_server;

pub use certs::DevPki;
pub use test_server::{free_port, init_tracing, query, TestServer};
