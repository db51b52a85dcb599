use std::fmt;
use num_enum::TryFromPrimitive;

/// Variant name for a known discriminant, `0x..` for anything else.
pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Short hex preview for logs: first `max` bytes plus total length.
pub fn fmt_bytes(bytes: &[u8], max: usize) -> String {
    if bytes.len() <= max {
        hex::encode(bytes)
    } else {
        format!("{}..({} bytes)", hex::encode(&bytes[..max]), bytes.len())
    }
}
