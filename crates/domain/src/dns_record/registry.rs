use super::record::{Record, RecordData, A, AAAA, CNAME, MX, NS, PTR, TXT};
use super::RecordType;
use crate::errors::WireError;
use crate::wire::WireReader;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

type DecodeFn = fn(&mut WireReader<'_>, usize) -> Result<Record, WireError>;

/// RDATA decoders keyed by TYPE code, built once on first use.
static DECODERS: LazyLock<FxHashMap<RecordType, DecodeFn>> = LazyLock::new(|| {
    let mut decoders = FxHashMap::default();
    register::<A>(&mut decoders);
    register::<AAAA>(&mut decoders);
    register::<CNAME>(&mut decoders);
    register::<NS>(&mut decoders);
    register::<PTR>(&mut decoders);
    register::<MX>(&mut decoders);
    register::<TXT>(&mut decoders);
    decoders
});

fn register<R: RecordData>(decoders: &mut FxHashMap<RecordType, DecodeFn>) {
    let decode: DecodeFn = |reader, len| R::decode_rdata(reader, len).map(Into::into);
    decoders.insert(R::TYPE, decode);
}

pub fn is_supported(record_type: RecordType) -> bool {
    DECODERS.contains_key(&record_type)
}

pub(crate) fn decode_rdata(
    record_type: RecordType,
    reader: &mut WireReader<'_>,
    len: usize,
) -> Result<Record, WireError> {
    let decode = DECODERS
        .get(&record_type)
        .ok_or(WireError::UnsupportedRecordType(record_type.to_u16()))?;

    if len > reader.remaining() {
        return Err(WireError::MalformedResource(format!(
            "RDATA length {} exceeds remaining {} bytes",
            len,
            reader.remaining()
        )));
    }

    let start = reader.position();
    let record = decode(reader, len)?;
    let consumed = reader.position() - start;
    if consumed != len {
        return Err(WireError::MalformedResource(format!(
            "{} RDATA length {} but payload used {} bytes",
            record_type, len, consumed
        )));
    }
    Ok(record)
}
