use crate::errors::WireError;
use std::sync::Arc;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 63;

/// Returns `name` in canonical fully-qualified form (`"example.com."`).
pub fn fqdn(name: &str) -> Arc<str> {
    if name.is_empty() || name == "." {
        return Arc::from(".");
    }
    if name.ends_with('.') {
        Arc::from(name)
    } else {
        Arc::from(format!("{}.", name))
    }
}

/// Appends the uncompressed wire form of `name` to `out`.
///
/// On error `out` is left as it was before the call.
pub fn write_name(out: &mut Vec<u8>, name: &str) -> Result<(), WireError> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        out.push(0);
        return Ok(());
    }

    let start = out.len();
    for label in trimmed.split('.') {
        if label.is_empty() {
            out.truncate(start);
            return Err(WireError::InvalidName(name.to_string()));
        }
        if label.len() > MAX_LABEL_LEN {
            out.truncate(start);
            return Err(WireError::LabelTooLong(name.to_string()));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);

    if out.len() - start > MAX_NAME_LEN {
        out.truncate(start);
        return Err(WireError::NameTooLong(name.to_string()));
    }
    Ok(())
}
