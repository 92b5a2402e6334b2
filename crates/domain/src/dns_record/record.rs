#![allow(clippy::upper_case_acronyms)]

use super::registry;
use super::RecordType;
use crate::errors::WireError;
use crate::wire::{fqdn, write_name, WireReader};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// A record payload type: its TYPE code plus how its RDATA is written and read.
///
/// Adding a record type means implementing this trait, adding a [`Record`]
/// variant and registering the decoder in [`registry`].
pub trait RecordData: Sized + Into<Record> {
    const TYPE: RecordType;

    fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError>;

    /// Decodes exactly `len` bytes of RDATA starting at the reader's position.
    fn decode_rdata(reader: &mut WireReader<'_>, len: usize) -> Result<Self, WireError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A(pub Ipv4Addr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AAAA(pub Ipv6Addr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CNAME(pub Arc<str>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NS(pub Arc<str>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PTR(pub Arc<str>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MX {
    pub preference: u16,
    pub exchange: Arc<str>,
}

impl MX {
    pub fn new(preference: u16, exchange: &str) -> Self {
        Self {
            preference,
            exchange: fqdn(exchange),
        }
    }
}

/// One or more character-strings, each at most 255 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TXT(pub Vec<Vec<u8>>);

impl TXT {
    /// Splits `text` into 255-byte character-strings.
    pub fn from_text(text: &str) -> Self {
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return TXT(vec![Vec::new()]);
        }
        TXT(bytes.chunks(255).map(<[u8]>::to_vec).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Record {
    A(A),
    AAAA(AAAA),
    CNAME(CNAME),
    NS(NS),
    PTR(PTR),
    MX(MX),
    TXT(TXT),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::A(_) => A::TYPE,
            Record::AAAA(_) => AAAA::TYPE,
            Record::CNAME(_) => CNAME::TYPE,
            Record::NS(_) => NS::TYPE,
            Record::PTR(_) => PTR::TYPE,
            Record::MX(_) => MX::TYPE,
            Record::TXT(_) => TXT::TYPE,
        }
    }

    pub fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            Record::A(r) => r.encode_rdata(out),
            Record::AAAA(r) => r.encode_rdata(out),
            Record::CNAME(r) => r.encode_rdata(out),
            Record::NS(r) => r.encode_rdata(out),
            Record::PTR(r) => r.encode_rdata(out),
            Record::MX(r) => r.encode_rdata(out),
            Record::TXT(r) => r.encode_rdata(out),
        }
    }

    pub fn decode_rdata(
        record_type: RecordType,
        reader: &mut WireReader<'_>,
        len: usize,
    ) -> Result<Self, WireError> {
        registry::decode_rdata(record_type, reader, len)
    }

    pub fn ip_addr(&self) -> Option<IpAddr> {
        match self {
            Record::A(A(ip)) => Some(IpAddr::V4(*ip)),
            Record::AAAA(AAAA(ip)) => Some(IpAddr::V6(*ip)),
            _ => None,
        }
    }
}

impl From<Ipv4Addr> for Record {
    fn from(ip: Ipv4Addr) -> Self {
        Record::A(A(ip))
    }
}

impl From<Ipv6Addr> for Record {
    fn from(ip: Ipv6Addr) -> Self {
        Record::AAAA(AAAA(ip))
    }
}

impl From<IpAddr> for Record {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

macro_rules! impl_from_rdata {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Record {
                fn from(rdata: $variant) -> Self {
                    Record::$variant(rdata)
                }
            }
        )*
    };
}

impl_from_rdata!(A, AAAA, CNAME, NS, PTR, MX, TXT);

fn expect_len(record_type: RecordType, len: usize, want: usize) -> Result<(), WireError> {
    if len != want {
        return Err(WireError::MalformedResource(format!(
            "{} RDATA must be {} bytes, got {}",
            record_type, want, len
        )));
    }
    Ok(())
}

impl RecordData for A {
    const TYPE: RecordType = RecordType::A;

    fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        out.extend_from_slice(&self.0.octets());
        Ok(())
    }

    fn decode_rdata(reader: &mut WireReader<'_>, len: usize) -> Result<Self, WireError> {
        expect_len(Self::TYPE, len, 4)?;
        let b = reader.read_bytes(4)?;
        Ok(A(Ipv4Addr::new(b[0], b[1], b[2], b[3])))
    }
}

impl RecordData for AAAA {
    const TYPE: RecordType = RecordType::AAAA;

    fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        out.extend_from_slice(&self.0.octets());
        Ok(())
    }

    fn decode_rdata(reader: &mut WireReader<'_>, len: usize) -> Result<Self, WireError> {
        expect_len(Self::TYPE, len, 16)?;
        let mut octets = [0u8; 16];
        octets.copy_from_slice(reader.read_bytes(16)?);
        Ok(AAAA(Ipv6Addr::from(octets)))
    }
}

macro_rules! impl_single_name_rdata {
    ($ty:ident, $rtype:expr) => {
        impl $ty {
            pub fn new(name: &str) -> Self {
                $ty(fqdn(name))
            }
        }

        impl RecordData for $ty {
            const TYPE: RecordType = $rtype;

            fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
                write_name(out, &self.0)
            }

            fn decode_rdata(reader: &mut WireReader<'_>, _len: usize) -> Result<Self, WireError> {
                Ok($ty(reader.read_name()?))
            }
        }
    };
}

impl_single_name_rdata!(CNAME, RecordType::CNAME);
impl_single_name_rdata!(NS, RecordType::NS);
impl_single_name_rdata!(PTR, RecordType::PTR);

impl RecordData for MX {
    const TYPE: RecordType = RecordType::MX;

    fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        out.extend_from_slice(&self.preference.to_be_bytes());
        write_name(out, &self.exchange)
    }

    fn decode_rdata(reader: &mut WireReader<'_>, _len: usize) -> Result<Self, WireError> {
        let preference = reader.read_u16()?;
        let exchange = reader.read_name()?;
        Ok(MX {
            preference,
            exchange,
        })
    }
}

impl RecordData for TXT {
    const TYPE: RecordType = RecordType::TXT;

    fn encode_rdata(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        if self.0.is_empty() {
            return Err(WireError::MalformedResource(
                "TXT RDATA must contain at least one character-string".to_string(),
            ));
        }
        for chunk in &self.0 {
            if chunk.len() > 255 {
                return Err(WireError::MalformedResource(format!(
                    "TXT character-string of {} bytes exceeds 255",
                    chunk.len()
                )));
            }
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
        Ok(())
    }

    fn decode_rdata(reader: &mut WireReader<'_>, len: usize) -> Result<Self, WireError> {
        if len == 0 {
            return Err(WireError::MalformedResource(
                "TXT RDATA must contain at least one character-string".to_string(),
            ));
        }
        let end = reader.position() + len;
        let mut strings = Vec::new();
        while reader.position() < end {
            let chunk_len = reader.read_u8()? as usize;
            strings.push(reader.read_bytes(chunk_len)?.to_vec());
        }
        Ok(TXT(strings))
    }
}
