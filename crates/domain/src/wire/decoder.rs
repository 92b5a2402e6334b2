use super::encoder::HEADER_LEN;
use super::reader::{ReadError, WireReader};
use crate::dns_record::{Record, RecordClass, RecordType};
use crate::errors::WireError;
use crate::message::{Message, OpCode, ResponseCode};
use crate::question::Question;
use crate::resource::Resource;
use std::time::Duration;

/// Root name plus TYPE and CLASS.
const MIN_QUESTION_LEN: usize = 5;
/// Root name plus TYPE, CLASS, TTL and RDLENGTH.
const MIN_RESOURCE_LEN: usize = 11;

struct Header {
    id: u16,
    flags: u16,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
}

/// Parses a complete message. The whole buffer must be consumed.
pub fn decode(bytes: &[u8]) -> Result<Message, WireError> {
    if bytes.len() < HEADER_LEN {
        return Err(WireError::MalformedHeader(format!(
            "need {} bytes, got {}",
            HEADER_LEN,
            bytes.len()
        )));
    }

    let mut reader = WireReader::new(bytes);
    let header =
        read_header(&mut reader).map_err(|e| WireError::MalformedHeader(e.to_string()))?;

    let mut questions =
        Vec::with_capacity(section_capacity(header.qdcount, &reader, MIN_QUESTION_LEN));
    for idx in 0..header.qdcount {
        let question = read_question(&mut reader)
            .map_err(|e| WireError::MalformedQuestion(format!("question {}: {}", idx, e)))?;
        questions.push(question);
    }

    let answers = read_section(&mut reader, header.ancount)?;
    let authorities = read_section(&mut reader, header.nscount)?;
    let additionals = read_section(&mut reader, header.arcount)?;

    if reader.remaining() > 0 {
        return Err(WireError::TrailingBytes(reader.remaining()));
    }

    let flags = header.flags;
    Ok(Message {
        id: header.id,
        response: flags & 0x8000 != 0,
        opcode: OpCode::from_u8(((flags >> 11) & 0x0F) as u8),
        authoritative: flags & 0x0400 != 0,
        truncated: flags & 0x0200 != 0,
        recursion_desired: flags & 0x0100 != 0,
        recursion_available: flags & 0x0080 != 0,
        response_code: ResponseCode::from_u8((flags & 0x0F) as u8),
        questions,
        answers,
        authorities,
        additionals,
    })
}

fn read_header(reader: &mut WireReader<'_>) -> Result<Header, ReadError> {
    Ok(Header {
        id: reader.read_u16()?,
        flags: reader.read_u16()?,
        qdcount: reader.read_u16()?,
        ancount: reader.read_u16()?,
        nscount: reader.read_u16()?,
        arcount: reader.read_u16()?,
    })
}

fn read_question(reader: &mut WireReader<'_>) -> Result<Question, ReadError> {
    let name = reader.read_name()?;
    let record_type = RecordType::from_u16(reader.read_u16()?);
    let class = RecordClass::from_u16(reader.read_u16()?);
    Ok(Question {
        name,
        record_type,
        class,
    })
}

fn read_section(reader: &mut WireReader<'_>, count: u16) -> Result<Vec<Resource>, WireError> {
    let mut resources = Vec::with_capacity(section_capacity(count, reader, MIN_RESOURCE_LEN));
    for _ in 0..count {
        resources.push(read_resource(reader)?);
    }
    Ok(resources)
}

/// Header counts are untrusted; reserve no more entries than the remaining
/// bytes could hold.
fn section_capacity(count: u16, reader: &WireReader<'_>, min_len: usize) -> usize {
    usize::from(count).min(reader.remaining() / min_len)
}

fn read_resource(reader: &mut WireReader<'_>) -> Result<Resource, WireError> {
    let name = reader.read_name()?;
    let record_type = RecordType::from_u16(reader.read_u16()?);
    let class = RecordClass::from_u16(reader.read_u16()?);
    let ttl = reader.read_u32()?;
    let rdlen = reader.read_u16()? as usize;

    let record = Record::decode_rdata(record_type, reader, rdlen)?;

    Ok(Resource {
        name,
        class,
        ttl: Duration::from_secs(ttl as u64),
        record,
    })
}
