//! Field validators for music-industry identifiers.
//!
//! Every validator takes a raw string and either returns the normalized
//! value or fails with a [`FieldError`]. Checksum mismatches are never
//! guess-corrected; the only permitted normalizations are the documented
//! ones (stripping separator characters from ISWC/ISRC/IPI base, left
//! zero-padding IPI name numbers, uppercasing ISRC).
//!
//! # Supported field kinds
//!
//! | Kind     | Shape                           | Checksum                      |
//! |----------|---------------------------------|-------------------------------|
//! | ISWC     | `T` + 10 digits                 | mod-10 weighted, weight 1     |
//! | IPI base | `I-NNNNNNNNN-C`                 | mod-10 weighted, weight 2     |
//! | IPI name | 11 digits                       | mod-101, two check digits     |
//! | ISRC     | 2 letters + 3 alnum + 7 digits  | none                          |
//! | ISNI     | 16 digits (last may be `X`)     | mod-11 doubling               |
//! | EAN-13   | 13 digits                       | mod-10 alternating 1/3        |
//! | Title    | CWR character set               | none                          |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FieldError, FieldResult};

/// The sentinel IPI name number societies use for "not yet assigned".
pub const IPI_NAME_UNASSIGNED: &str = "00000000000";

static ISRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{3}[0-9]{7}$").expect("valid regex"));

/// Characters allowed in CWR titles and names. Lowercase letters are
/// accepted here; case normalization happens at serialization time.
static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    // The class contains `"#`, so the raw string needs a double-hash
    // delimiter.
    Regex::new(r##"^[A-Za-z0-9 !"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~¡¿£€¥]*$"##)
        .expect("valid regex")
});

// =============================================================================
// Character set
// =============================================================================

/// Validate a work or alternate title against the CWR character set.
pub fn validate_title(raw: &str) -> FieldResult<String> {
    validate_charset(raw, "Title")
}

/// Validate a person or publisher name against the CWR character set.
pub fn validate_name(raw: &str) -> FieldResult<String> {
    validate_charset(raw, "Name")
}

fn validate_charset(raw: &str, field: &'static str) -> FieldResult<String> {
    if let Some(ch) = raw.chars().find(|c| !TITLE_RE.is_match(&c.to_string())) {
        return Err(FieldError::BadCharacter { field, ch });
    }
    Ok(raw.to_string())
}

// =============================================================================
// ISWC
// =============================================================================

/// Validate an ISWC (`T` + 9 digits + check digit).
///
/// Separator characters (`-`, `.`, space) are stripped first, so both
/// `T-123.456.789-4` and `T1234567894` normalize to `T1234567894`.
pub fn validate_iswc(raw: &str) -> FieldResult<String> {
    let value = strip_separators(raw).to_uppercase();
    let digits = match value.strip_prefix('T') {
        Some(d) if d.len() == 10 && d.bytes().all(|b| b.is_ascii_digit()) => d,
        _ => {
            return Err(FieldError::BadFormat {
                field: "ISWC",
                value,
            })
        }
    };
    if weighted_check_digit(&digits[..9], 1) != digit_at(digits, 9) {
        return Err(FieldError::BadChecksum {
            field: "ISWC",
            value,
        });
    }
    Ok(value)
}

// =============================================================================
// IPI base number
// =============================================================================

/// Validate an IPI base number and normalize it to `I-NNNNNNNNN-C`.
///
/// Uses the same weighted mod-10 checksum as the ISWC, with weight 2.
pub fn validate_ipi_base(raw: &str) -> FieldResult<String> {
    let value = strip_separators(raw).to_uppercase();
    let digits = match value.strip_prefix('I') {
        Some(d) if d.len() == 10 && d.bytes().all(|b| b.is_ascii_digit()) => d,
        _ => {
            return Err(FieldError::BadFormat {
                field: "IPI base number",
                value,
            })
        }
    };
    if weighted_check_digit(&digits[..9], 2) != digit_at(digits, 9) {
        return Err(FieldError::BadChecksum {
            field: "IPI base number",
            value,
        });
    }
    Ok(format!("I-{}-{}", &digits[..9], &digits[9..]))
}

// =============================================================================
// IPI name number
// =============================================================================

/// Validate an IPI name number (11 digits, two-digit mod-101 checksum).
///
/// Shorter all-digit inputs are left-padded with zeros to 11 digits. The
/// all-zero sentinel means "not yet assigned" and yields `Ok(None)` so
/// callers can treat it as absent for matching purposes.
pub fn validate_ipi_name(raw: &str) -> FieldResult<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) || trimmed.len() > 11 {
        return Err(FieldError::BadFormat {
            field: "IPI name number",
            value: trimmed.to_string(),
        });
    }
    let value = format!("{:0>11}", trimmed);
    if value == IPI_NAME_UNASSIGNED {
        return Ok(None);
    }
    let sum: u32 = value
        .bytes()
        .take(9)
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * (10 - i as u32))
        .sum();
    let expected = (101 - sum % 101) % 100;
    let given: u32 = value[9..].parse().expect("two digits");
    if expected != given {
        return Err(FieldError::BadChecksum {
            field: "IPI name number",
            value,
        });
    }
    Ok(Some(value))
}

// =============================================================================
// ISRC
// =============================================================================

/// Validate an ISRC (country code + registrant + year + designation).
///
/// Dashes, dots and spaces are stripped and the value is uppercased.
pub fn validate_isrc(raw: &str) -> FieldResult<String> {
    let value = strip_separators(raw).to_uppercase();
    if !ISRC_RE.is_match(&value) {
        return Err(FieldError::BadFormat {
            field: "ISRC",
            value,
        });
    }
    Ok(value)
}

// =============================================================================
// ISNI
// =============================================================================

/// Validate an ISNI (15 digits plus a mod-11 check character, `X` for 10).
pub fn validate_isni(raw: &str) -> FieldResult<String> {
    let value = strip_separators(raw).to_uppercase();
    // ASCII check first: byte indexing below is only safe afterwards.
    if !value.is_ascii()
        || value.len() != 16
        || !value[..15].bytes().all(|b| b.is_ascii_digit())
        || !matches!(value.as_bytes()[15], b'0'..=b'9' | b'X')
    {
        return Err(FieldError::BadFormat {
            field: "ISNI",
            value,
        });
    }
    let mut total: u64 = 0;
    for b in value.bytes().take(15) {
        total = 2 * (total + u64::from(b - b'0'));
    }
    let check = (12 - total % 11) % 11;
    let expected = if check == 10 {
        'X'
    } else {
        char::from(b'0' + check as u8)
    };
    if value.chars().nth(15) != Some(expected) {
        return Err(FieldError::BadChecksum {
            field: "ISNI",
            value,
        });
    }
    Ok(value)
}

// =============================================================================
// EAN-13
// =============================================================================

/// Validate an EAN-13 barcode number.
pub fn validate_ean(raw: &str) -> FieldResult<String> {
    let value = raw.trim().to_string();
    if value.len() != 13 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::BadFormat {
            field: "EAN",
            value,
        });
    }
    let sum: u32 = value
        .bytes()
        .take(12)
        .enumerate()
        .map(|(i, b)| u32::from(b - b'0') * if i % 2 == 0 { 1 } else { 3 })
        .sum();
    let check = (10 - sum % 10) % 10;
    if check != digit_at(&value, 12) {
        return Err(FieldError::BadChecksum {
            field: "EAN",
            value,
        });
    }
    Ok(value)
}

// =============================================================================
// Helpers
// =============================================================================

fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect()
}

/// Weighted mod-10 check digit shared by ISWC (weight 1) and IPI base
/// (weight 2): positions are multiplied by 1..=9, the weight is added,
/// and the check digit is `(10 - total % 10) % 10`.
fn weighted_check_digit(payload: &str, weight: u32) -> u32 {
    let total: u32 = weight
        + payload
            .bytes()
            .enumerate()
            .map(|(i, b)| u32::from(b - b'0') * (i as u32 + 1))
            .sum::<u32>();
    (10 - total % 10) % 10
}

fn digit_at(s: &str, index: usize) -> u32 {
    u32::from(s.as_bytes()[index] - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iswc_valid() {
        assert_eq!(validate_iswc("T1234567894").unwrap(), "T1234567894");
        // Separators stripped
        assert_eq!(validate_iswc("T-123.456.789-4").unwrap(), "T1234567894");
    }

    #[test]
    fn test_iswc_bad_checksum() {
        assert_eq!(
            validate_iswc("T1234567893"),
            Err(FieldError::BadChecksum {
                field: "ISWC",
                value: "T1234567893".into()
            })
        );
    }

    #[test]
    fn test_iswc_bad_format() {
        assert!(validate_iswc("X1234567894").is_err());
        assert!(validate_iswc("T123").is_err());
        assert!(validate_iswc("").is_err());
    }

    #[test]
    fn test_ipi_base_valid_and_normalized() {
        // Same payload as the ISWC test but with weight 2 the check digit
        // shifts from 4 to 3.
        assert_eq!(validate_ipi_base("I-123456789-3").unwrap(), "I-123456789-3");
        assert_eq!(validate_ipi_base("I1234567893").unwrap(), "I-123456789-3");
        assert!(validate_ipi_base("I-123456789-4").is_err());
    }

    #[test]
    fn test_ipi_name_valid() {
        // Sum of 1*10+9*9+9*8+9*7+9*6+9*5+9*4+9*3+9*2 = 406; 406 % 101 = 2;
        // check digits = (101 - 2) % 100 = 99.
        assert_eq!(
            validate_ipi_name("19999999999").unwrap(),
            Some("19999999999".into())
        );
        assert!(validate_ipi_name("19999999998").is_err());
    }

    #[test]
    fn test_ipi_name_padding() {
        // The checksum is computed over the first 9 digits only, so the
        // check digits of the padded value come from "000000002".
        let sum: u32 = "000000002"
            .bytes()
            .enumerate()
            .map(|(i, b)| u32::from(b - b'0') * (10 - i as u32))
            .sum();
        let check = (101 - sum % 101) % 100;
        let padded = format!("000000002{:02}", check);
        assert_eq!(validate_ipi_name(&padded[2..]).unwrap(), Some(padded));
    }

    #[test]
    fn test_ipi_name_sentinel_is_null() {
        assert_eq!(validate_ipi_name("00000000000").unwrap(), None);
        assert_eq!(validate_ipi_name("0").unwrap(), None);
    }

    #[test]
    fn test_ipi_name_mutation_detected() {
        // Flipping any payload digit of a valid number must break the check.
        let valid = "19999999999";
        for i in 0..9 {
            let mut bytes = valid.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'9' { b'8' } else { b'9' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(validate_ipi_name(&mutated).is_err(), "mutation at {i}");
        }
    }

    #[test]
    fn test_isrc() {
        assert_eq!(validate_isrc("US-S1Z-99-00001").unwrap(), "USS1Z9900001");
        assert_eq!(validate_isrc("uss1z9900001").unwrap(), "USS1Z9900001");
        assert!(validate_isrc("1SS1Z9900001").is_err());
        assert!(validate_isrc("USS1Z990000").is_err());
    }

    #[test]
    fn test_isni() {
        assert_eq!(
            validate_isni("000000000000001X").unwrap(),
            "000000000000001X"
        );
        assert!(validate_isni("0000000000000010").is_err());
        assert!(validate_isni("00000000000001").is_err());
    }

    #[test]
    fn test_isni_multibyte_input_rejected() {
        // 14 digits plus a two-byte character: 16 bytes but not 16 digits.
        // Must fail cleanly rather than slice mid-character.
        assert_eq!(
            validate_isni("00000000000000¡"),
            Err(FieldError::BadFormat {
                field: "ISNI",
                value: "00000000000000¡".into()
            })
        );
        assert!(validate_isni("œ000000000000001").is_err());
    }

    #[test]
    fn test_ean() {
        assert_eq!(validate_ean("4006381333931").unwrap(), "4006381333931");
        assert!(validate_ean("4006381333932").is_err());
        assert!(validate_ean("400638133393").is_err());
    }

    #[test]
    fn test_title_charset() {
        assert!(validate_title("THE NIGHT (REMIX) #2 £5").is_ok());
        assert!(validate_title("Mixed Case is fine").is_ok());
        let err = validate_title("SONG™").unwrap_err();
        assert_eq!(
            err,
            FieldError::BadCharacter {
                field: "Title",
                ch: '™'
            }
        );
    }

    #[test]
    fn test_name_charset() {
        assert!(validate_name("O'HARA-SMITH JR.").is_ok());
        assert!(validate_name("MÜLLER").is_err());
    }
}
