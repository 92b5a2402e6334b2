use crate::dns_record::{Record, RecordClass, RecordType};
use crate::wire::fqdn;
use std::sync::Arc;
use std::time::Duration;

/// A resource record: owner name, class, TTL and typed payload.
///
/// The TTL travels as whole seconds; sub-second parts are dropped on encode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub name: Arc<str>,
    pub class: RecordClass,
    pub ttl: Duration,
    pub record: Record,
}

impl Resource {
    pub fn new(name: &str, ttl: Duration, record: impl Into<Record>) -> Self {
        Self {
            name: fqdn(name),
            class: RecordClass::IN,
            ttl,
            record: record.into(),
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record.record_type()
    }

    pub fn ttl_secs(&self) -> u32 {
        u32::try_from(self.ttl.as_secs()).unwrap_or(u32::MAX)
    }
}
