//! Legacy numeric text: whitespace-separated sample values.

/// Whether `token` is a plain decimal number: optional sign, digits with an
/// optional fraction, or a bare fraction (`.5`).
pub fn is_numeric_token(token: &str) -> bool {
    let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    match frac_part {
        None => !int_part.is_empty() && all_digits(int_part),
        Some(frac) => {
            all_digits(int_part) && all_digits(frac) && !(int_part.is_empty() && frac.is_empty())
        }
    }
}

/// Collect every numeric token as a sample.
///
/// Each value is floored and wrapped modulo 256, so `256` reads as 0 and
/// `-1` as 255. Other tokens are skipped.
pub fn parse_samples(text: &str) -> Vec<u8> {
    text.split_whitespace()
        .filter(|token| is_numeric_token(token))
        .filter_map(|token| token.parse::<f64>().ok())
        .map(|value| (value.floor() as i64).rem_euclid(256) as u8)
        .collect()
}

/// Whether raw bytes look like numeric text: only ASCII digits, signs, dots
/// and whitespace, with at least one digit.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    bytes.iter().any(u8::is_ascii_digit)
        && bytes
            .iter()
            .all(|b| b.is_ascii_digit() || b.is_ascii_whitespace() || matches!(b, b'+' | b'-' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_tokens() {
        for token in ["0", "255", "+3", "-4", "1.5", "7.", ".5", "-.25"] {
            assert!(is_numeric_token(token), "{} should be numeric", token);
        }
        for token in ["", ".", "-", "1e3", "0x10", "1.2.3", "abc", "--1"] {
            assert!(!is_numeric_token(token), "{} should not be numeric", token);
        }
    }

    #[test]
    fn test_parse_samples_floors_and_wraps() {
        let samples = parse_samples("12 7.9\n-1 256 300 junk 1e3\n.5");
        assert_eq!(samples, vec![12, 7, 255, 0, 44, 0]);
    }

    #[test]
    fn test_looks_like_text() {
        assert!(looks_like_text(b" 1 2\n3.5 -4\r\n"));
        assert!(!looks_like_text(b" \n. -"));
        assert!(!looks_like_text(&[b'1', 0xff]));
    }
}
