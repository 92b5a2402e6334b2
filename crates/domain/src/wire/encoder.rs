use super::name::write_name;
use crate::errors::WireError;
use crate::message::Message;
use crate::resource::Resource;

pub const HEADER_LEN: usize = 12;

const FLAG_QR: u16 = 0x8000;
const FLAG_AA: u16 = 0x0400;
const FLAG_TC: u16 = 0x0200;
const FLAG_RD: u16 = 0x0100;
const FLAG_RA: u16 = 0x0080;

/// Serializes `message`, keeping at most `limit` bytes (`None` = unbounded).
///
/// Header and questions must always fit. Resource records are then appended
/// in section order (answers, authorities, additionals) until the first one
/// that would overflow `limit`; it and every record after it are dropped and
/// the TC bit is set. Truncation is not an error.
pub fn encode(message: &Message, limit: Option<usize>) -> Result<Vec<u8>, WireError> {
    let limit = limit.unwrap_or(usize::MAX);

    let mut out = Vec::with_capacity(512);
    out.extend_from_slice(&[0u8; HEADER_LEN]);

    for question in &message.questions {
        write_name(&mut out, &question.name)?;
        out.extend_from_slice(&question.record_type.to_u16().to_be_bytes());
        out.extend_from_slice(&question.class.to_u16().to_be_bytes());
    }

    if out.len() > limit {
        return Err(WireError::MessageTooLarge {
            size: out.len(),
            limit,
        });
    }

    let mut counts = [0u16; 3];
    let mut truncated = message.truncated;
    let mut rr_buf = Vec::with_capacity(64);

    let sections = [
        &message.answers,
        &message.authorities,
        &message.additionals,
    ];
    'sections: for (idx, section) in sections.iter().enumerate() {
        for resource in section.iter() {
            rr_buf.clear();
            write_resource(&mut rr_buf, resource)?;

            if out.len() + rr_buf.len() > limit {
                truncated = true;
                break 'sections;
            }
            out.extend_from_slice(&rr_buf);
            counts[idx] = counts[idx].checked_add(1).ok_or(WireError::MessageTooLarge {
                size: out.len(),
                limit,
            })?;
        }
    }

    let qdcount = u16::try_from(message.questions.len()).map_err(|_| {
        WireError::MessageTooLarge {
            size: out.len(),
            limit,
        }
    })?;

    let mut flags: u16 = 0;
    if message.response {
        flags |= FLAG_QR;
    }
    flags |= (message.opcode.to_u8() as u16 & 0x0F) << 11;
    if message.authoritative {
        flags |= FLAG_AA;
    }
    if truncated {
        flags |= FLAG_TC;
    }
    if message.recursion_desired {
        flags |= FLAG_RD;
    }
    if message.recursion_available {
        flags |= FLAG_RA;
    }
    flags |= message.response_code.to_u8() as u16 & 0x0F;

    out[0..2].copy_from_slice(&message.id.to_be_bytes());
    out[2..4].copy_from_slice(&flags.to_be_bytes());
    out[4..6].copy_from_slice(&qdcount.to_be_bytes());
    out[6..8].copy_from_slice(&counts[0].to_be_bytes());
    out[8..10].copy_from_slice(&counts[1].to_be_bytes());
    out[10..12].copy_from_slice(&counts[2].to_be_bytes());

    Ok(out)
}

fn write_resource(out: &mut Vec<u8>, resource: &Resource) -> Result<(), WireError> {
    write_name(out, &resource.name)?;
    out.extend_from_slice(&resource.record_type().to_u16().to_be_bytes());
    out.extend_from_slice(&resource.class.to_u16().to_be_bytes());
    out.extend_from_slice(&resource.ttl_secs().to_be_bytes());

    let rdlen_at = out.len();
    out.extend_from_slice(&[0, 0]);
    resource.record.encode_rdata(out)?;

    let rdlen = u16::try_from(out.len() - rdlen_at - 2).map_err(|_| {
        WireError::MalformedResource(format!(
            "RDATA of {} exceeds 65535 bytes",
            resource.name
        ))
    })?;
    out[rdlen_at..rdlen_at + 2].copy_from_slice(&rdlen.to_be_bytes());
    Ok(())
}
