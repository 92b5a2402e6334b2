pub mod record;
pub mod record_class;
pub mod record_type;
pub mod registry;

pub use record::{Record, RecordData, A, AAAA, CNAME, MX, NS, PTR, TXT};
pub use record_class::RecordClass;
pub use record_type::RecordType;
