use std::path::PathBuf;

use thiserror::Error;


#[derive(Debug, Error)]
pub enum Error {
    #[error("open {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stat {}: {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is {current} bytes, larger than requested size {target}", path.display())]
    SizeExceeded {
        path: PathBuf,
        current: u64,
        target: u64,
    },
    #[error("pad size {target} smaller than input size of {}", path.display())]
    InputTooLarge {
        path: PathBuf,
        target: u64,
    },
    #[error("invalid size: {0:?}")]
    InvalidSize(String),
    #[error("size does not fit in 64 bits: {0:?}")]
    SizeOverflow(String),
    #[error("invalid fill byte: {0:?}")]
    InvalidFill(String),
}


pub type Result<T> = std::result::Result<T, Error>;


const SCALE: u64 = 1024;


/// Result of scanning a size: the value (`None` on overflow) and the
/// number of bytes of `text` that were consumed.
struct Scanned {
    value: Option<u64>,
    consumed: usize,
}


fn digit_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u32),
        b'a'..=b'z' => Some((c - b'a') as u32 + 10),
        b'A'..=b'Z' => Some((c - b'A') as u32 + 10),
        _ => None,
    }
}


/// Scans a leading integer the way `strtoull` does: optional whitespace,
/// an optional sign, an optional `0x` prefix for base 16, then digits.
/// Base 0 picks 16 for `0x`, 8 for a leading `0` and 10 otherwise.
fn scan_integer(text: &[u8], base: u32) -> Scanned {
    let none = Scanned { value: Some(0), consumed: 0 };
    if base == 1 || base > 36 {
        return none;
    }

    let mut pos = 0;
    while pos < text.len() && text[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let mut negative = false;
    if pos < text.len() && (text[pos] == b'+' || text[pos] == b'-') {
        negative = text[pos] == b'-';
        pos += 1;
    }

    let has_hex_prefix = text.len() > pos + 2
        && text[pos] == b'0'
        && (text[pos + 1] == b'x' || text[pos + 1] == b'X')
        && digit_value(text[pos + 2]).is_some_and(|d| d < 16);

    let base = match base {
        0 if has_hex_prefix => 16,
        0 if text.get(pos) == Some(&b'0') => 8,
        0 => 10,
        b => b,
    };
    if base == 16 && has_hex_prefix {
        pos += 2;
    }

    let start = pos;
    let mut value = Some(0u64);
    while let Some(d) = text.get(pos).and_then(|&c| digit_value(c)) {
        if d >= base {
            break;
        }
        value = value
            .and_then(|v| v.checked_mul(base as u64))
            .and_then(|v| v.checked_add(d as u64));
        pos += 1;
    }

    if pos == start {
        return none;
    }

    // strtoull negates in unsigned arithmetic
    if negative {
        value = value.map(u64::wrapping_neg);
    }

    Scanned { value, consumed: pos }
}


fn scan_size(text: &str, base: u32) -> Scanned {
    let bytes = text.as_bytes();
    let Scanned { mut value, mut consumed } = scan_integer(bytes, base);

    let steps = match bytes.get(consumed) {
        Some(b'G') => 3,
        Some(b'M') => 2,
        Some(b'K') | Some(b'k') => 1,
        _ => 0,
    };
    // G falls through M, and M falls through K
    for _ in 0..steps {
        value = value.and_then(|v| v.checked_mul(SCALE));
    }
    if steps > 0 {
        consumed += 1;
    }

    Scanned { value, consumed }
}


/// Parses a leading integer in `base` followed by an optional `G`, `M`, `K`
/// or `k` suffix, returning the byte count and how many bytes of `text`
/// were consumed.
///
/// Input without a leading number yields a value of 0. The suffix check
/// still runs at the start position, so `"K"` consumes one byte. Values
/// that do not fit in a `u64` saturate to `u64::MAX`, including an
/// overflowing suffix multiply, where C's unsigned `*= 1024` would wrap
/// (`"17179869184G"` is `u64::MAX` here, 0 in C).
pub fn parse_size(text: &str, base: u32) -> (u64, usize) {
    let scanned = scan_size(text, base);
    (scanned.value.unwrap_or(u64::MAX), scanned.consumed)
}


/// Like [`parse_size`] with base 0, but the whole of `text` (ignoring
/// surrounding whitespace) must be a size and overflow is an error.
pub fn parse_size_strict(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if scan_integer(trimmed.as_bytes(), 0).consumed == 0 {
        return Err(Error::InvalidSize(text.to_string()));
    }
    let scanned = scan_size(trimmed, 0);
    if scanned.consumed != trimmed.len() {
        return Err(Error::InvalidSize(text.to_string()));
    }
    scanned.value.ok_or_else(|| Error::SizeOverflow(text.to_string()))
}


pub fn parse_fill(text: &str) -> Result<u8> {
    let trimmed = text.trim();
    let scanned = scan_integer(trimmed.as_bytes(), 0);
    if scanned.consumed == 0 || scanned.consumed != trimmed.len() {
        return Err(Error::InvalidFill(text.to_string()));
    }
    scanned
        .value
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| Error::InvalidFill(text.to_string()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimal() {
        assert_eq!(parse_size("4096", 10), (4096, 4));
    }

    #[test]
    fn suffixes_scale_by_powers_of_1024() {
        assert_eq!(parse_size("512K", 10), (524288, 4));
        assert_eq!(parse_size("512k", 10), (524288, 4));
        assert_eq!(parse_size("2M", 10), (2097152, 2));
        assert_eq!(parse_size("1G", 10), (1073741824, 2));
    }

    #[test]
    fn base_is_honored() {
        assert_eq!(parse_size("10", 16), (16, 2));
        assert_eq!(parse_size("0x10", 16), (16, 4));
        assert_eq!(parse_size("17", 8), (15, 2));
    }

    #[test]
    fn base_zero_detects_prefix() {
        assert_eq!(parse_size("0x1000", 0), (4096, 6));
        assert_eq!(parse_size("010", 0), (8, 3));
        assert_eq!(parse_size("0x1M", 0), (1048576, 4));
        assert_eq!(parse_size("0", 0), (0, 1));
    }

    #[test]
    fn only_one_suffix_character_is_consumed() {
        assert_eq!(parse_size("1KB", 10), (1024, 2));
        assert_eq!(parse_size("1MK", 10), (1048576, 2));
    }

    #[test]
    fn lowercase_m_and_g_are_not_suffixes() {
        assert_eq!(parse_size("3m", 10), (3, 1));
        assert_eq!(parse_size("3g", 10), (3, 1));
    }

    #[test]
    fn hex_digit_is_not_mistaken_for_suffix() {
        // 'b' is a digit in base 16, so the run continues
        assert_eq!(parse_size("1b", 16), (27, 2));
    }

    #[test]
    fn non_numeric_makes_no_progress() {
        assert_eq!(parse_size("abc", 10), (0, 0));
        assert_eq!(parse_size("", 10), (0, 0));
        assert_eq!(parse_size("   ", 10), (0, 0));
    }

    #[test]
    fn suffix_without_digits_is_still_consumed() {
        assert_eq!(parse_size("K", 10), (0, 1));
        assert_eq!(parse_size("G", 10), (0, 1));
        assert_eq!(parse_size(" K", 10), (0, 0));
    }

    #[test]
    fn leading_whitespace_and_sign() {
        assert_eq!(parse_size("  8K", 10), (8192, 4));
        assert_eq!(parse_size("+8", 10), (8, 2));
        assert_eq!(parse_size("-1", 10), (u64::MAX, 2));
    }

    #[test]
    fn bad_base_makes_no_progress() {
        assert_eq!(parse_size("10", 1), (0, 0));
        assert_eq!(parse_size("10", 37), (0, 0));
    }

    #[test]
    fn overflow_saturates() {
        assert_eq!(parse_size("99999999999999999999", 10).0, u64::MAX);
        assert_eq!(parse_size("17179869184G", 10).0, u64::MAX);
        assert_eq!(parse_size("17179869183G", 10).0, 17179869183 << 30);
    }

    #[test]
    fn strict_parse() {
        assert_eq!(parse_size_strict("16M").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_size_strict(" 4096 ").unwrap(), 4096);
        assert_eq!(parse_size_strict("0x200").unwrap(), 512);
        assert!(matches!(parse_size_strict("16MB"), Err(Error::InvalidSize(_))));
        assert!(matches!(parse_size_strict("M"), Err(Error::InvalidSize(_))));
        assert!(matches!(parse_size_strict(""), Err(Error::InvalidSize(_))));
        assert!(matches!(
            parse_size_strict("17179869184G"),
            Err(Error::SizeOverflow(_))
        ));
    }

    #[test]
    fn fill_byte() {
        assert_eq!(parse_fill("0").unwrap(), 0);
        assert_eq!(parse_fill("255").unwrap(), 255);
        assert_eq!(parse_fill("0xff").unwrap(), 0xff);
        assert!(matches!(parse_fill("256"), Err(Error::InvalidFill(_))));
        assert!(matches!(parse_fill("1K"), Err(Error::InvalidFill(_))));
        assert!(matches!(parse_fill("x"), Err(Error::InvalidFill(_))));
    }
}
