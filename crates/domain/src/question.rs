use crate::dns_record::{RecordClass, RecordType};
use crate::wire::fqdn;
use std::fmt;
use std::sync::Arc;

/// A question section entry. Equality and hashing cover all three fields, so
/// questions can key answer tables directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub class: RecordClass,
}

impl Question {
    /// Builds an `IN` question; `name` is made fully qualified.
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: fqdn(name),
            record_type,
            class: RecordClass::IN,
        }
    }

    pub fn with_class(mut self, class: RecordClass) -> Self {
        self.class = class;
        self
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.record_type)
    }
}
