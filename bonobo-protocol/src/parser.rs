//! Permissive parameter extraction.
//!
//! Parameters are looked up by their single-character key. A token matches
//! when the key is its first byte; the number directly after the key is
//! read with the usual float literal grammar (optional sign, digits,
//! optional fraction, optional exponent). Anything after the number is
//! ignored. A missing key or a key without a number yields the default.

/// Token separator
const SEPARATOR: u8 = b' ';

/// Find `key` in `line` and return the number that immediately follows it
///
/// Only the first token starting with `key` is considered. Scanning stops
/// at the end of the line or at an embedded NUL byte.
///
/// ```
/// use bonobo_protocol::parse_number;
///
/// let line = b"X12.5 Y-3 F200";
/// assert_eq!(parse_number(line, b'X', 0.0), 12.5);
/// assert_eq!(parse_number(line, b'Z', 7.0), 7.0);
/// ```
pub fn parse_number(line: &[u8], key: u8, default: f32) -> f32 {
    let end = line.iter().position(|&b| b == 0).unwrap_or(line.len());

    line[..end]
        .split(|&b| b == SEPARATOR)
        .find(|token| token.first() == Some(&key))
        .map(|token| leading_float(&token[1..]).unwrap_or(default))
        .unwrap_or(default)
}

/// Parse the longest float literal at the start of `bytes`
fn leading_float(bytes: &[u8]) -> Option<f32> {
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    // Exponent only counts when it carries digits ("1e" parses as 1)
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    core::str::from_utf8(&bytes[..end]).ok()?.parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
