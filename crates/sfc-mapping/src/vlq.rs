//! Base64 VLQ codec for version-3 source map `mappings` strings.

const BASE64_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE_MASK: i64 = 0b11111;
const VLQ_CONTINUATION_BIT: i64 = 0b100000;

fn decode_base64_char(byte: u8) -> Option<i64> {
    match byte {
        b'A'..=b'Z' => Some((byte - b'A') as i64),
        b'a'..=b'z' => Some((byte - b'a') as i64 + 26),
        b'0'..=b'9' => Some((byte - b'0') as i64 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Appends one signed value in base64 VLQ form.
pub fn encode(value: i64, out: &mut String) {
    // The sign lives in the lowest bit.
    let mut vlq = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = vlq & VLQ_BASE_MASK;
        vlq >>= VLQ_BASE_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        out.push(BASE64_CHARS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decodes every VLQ value in one comma-free segment.
///
/// Returns `None` on malformed input (bad base64 digit, dangling
/// continuation bit, or overflow).
pub fn decode_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::with_capacity(4);
    let mut value: i64 = 0;
    let mut shift: u32 = 0;
    let mut in_value = false;

    for byte in segment.bytes() {
        let digit = decode_base64_char(byte)?;
        value = value.checked_add((digit & VLQ_BASE_MASK).checked_shl(shift)?)?;
        shift += VLQ_BASE_SHIFT;
        in_value = true;
        if digit & VLQ_CONTINUATION_BIT == 0 {
            let negative = value & 1 == 1;
            let magnitude = value >> 1;
            values.push(if negative { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
            in_value = false;
        }
    }

    if in_value {
        return None; // dangling continuation bit
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: i64) -> i64 {
        let mut encoded = String::new();
        encode(value, &mut encoded);
        decode_segment(&encoded).unwrap()[0]
    }

    #[test]
    fn encodes_known_values() {
        let mut out = String::new();
        encode(0, &mut out);
        assert_eq!(out, "A");

        let mut out = String::new();
        encode(1, &mut out);
        assert_eq!(out, "C");

        let mut out = String::new();
        encode(-1, &mut out);
        assert_eq!(out, "D");

        let mut out = String::new();
        encode(16, &mut out);
        assert_eq!(out, "gB");
    }

    #[test]
    fn roundtrips_across_range() {
        for value in [-100_000, -33, -1, 0, 1, 15, 16, 31, 32, 1024, 123_456] {
            assert_eq!(roundtrip(value), value);
        }
    }

    #[test]
    fn decodes_multi_value_segment() {
        let mut encoded = String::new();
        for value in [4, 0, 2, 7] {
            encode(value, &mut encoded);
        }
        assert_eq!(decode_segment(&encoded).unwrap(), vec![4, 0, 2, 7]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_segment("!").is_none());
        // 'g' alone has its continuation bit set with nothing following.
        assert!(decode_segment("g").is_none());
    }
}
