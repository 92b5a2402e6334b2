use crate::dns_record::{Record, RecordType};
use crate::question::Question;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// A static address record served by the answer table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalDnsRecord {
    pub hostname: String,

    #[serde(default)]
    pub domain: Option<String>,

    pub ip: String,

    pub record_type: String,

    #[serde(default)]
    pub ttl: Option<u32>,
}

impl LocalDnsRecord {
    pub fn fqdn(&self, default_domain: &Option<String>) -> String {
        if let Some(ref domain) = self.domain {
            format!("{}.{}", self.hostname, domain)
        } else if let Some(ref default) = default_domain {
            format!("{}.{}", self.hostname, default)
        } else {
            self.hostname.clone()
        }
    }

    pub fn ttl_or_default(&self) -> u32 {
        self.ttl.unwrap_or(300)
    }

    /// Converts to the question it answers and the answering resource.
    ///
    /// The record type must agree with the address family of `ip`.
    pub fn to_resource(
        &self,
        default_domain: &Option<String>,
    ) -> Result<(Question, Resource), String> {
        let record_type: RecordType = self.record_type.parse()?;
        let ip: IpAddr = self
            .ip
            .parse()
            .map_err(|e| format!("Invalid IP '{}' for {}: {}", self.ip, self.hostname, e))?;

        let record = match (record_type, ip) {
            (RecordType::A, IpAddr::V4(_)) | (RecordType::AAAA, IpAddr::V6(_)) => Record::from(ip),
            _ => {
                return Err(format!(
                    "Record type {} does not match address {} for {}",
                    record_type, ip, self.hostname
                ))
            }
        };

        let name = self.fqdn(default_domain);
        let resource = Resource::new(
            &name,
            Duration::from_secs(self.ttl_or_default() as u64),
            record,
        );
        Ok((Question::new(&name, record_type), resource))
    }
}
