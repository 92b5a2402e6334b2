//! RFC 1035 binary codec.
//!
//! Names are always written uncompressed; compression pointers are accepted
//! when reading.

mod decoder;
mod encoder;
mod name;
mod reader;

pub use decoder::decode;
pub use encoder::{encode, HEADER_LEN};
pub use name::{fqdn, write_name, MAX_LABEL_LEN, MAX_NAME_LEN};
pub use reader::{ReadError, WireReader};
