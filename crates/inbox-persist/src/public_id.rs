//! Public identifiers handed out to API clients.
//!
//! A public id is a random 128-bit uuid rendered in lower-case base36 and
//! left-padded to a fixed width, so ids sort and compare as plain strings.

use uuid::Uuid;

/// Width of a base36-encoded `u128`.
pub const PUBLIC_ID_LEN: usize = 25;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh public id
pub fn generate() -> String {
    encode(Uuid::new_v4().as_u128())
}

fn encode(mut value: u128) -> String {
    let mut buf = [b'0'; PUBLIC_ID_LEN];
    let mut idx = PUBLIC_ID_LEN;
    while value > 0 {
        idx -= 1;
        buf[idx] = ALPHABET[(value % 36) as usize];
        value /= 36;
    }
    buf.iter().map(|b| *b as char).collect()
}

/// Whether `candidate` looks like something `generate` could have produced
pub fn is_valid(candidate: &str) -> bool {
    candidate.len() == PUBLIC_ID_LEN
        && candidate.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = generate();
        let b = generate();
        assert!(is_valid(&a));
        assert!(is_valid(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_encode_pads_small_values() {
        assert_eq!(encode(0), "0".repeat(PUBLIC_ID_LEN));
        assert_eq!(encode(35), format!("{}z", "0".repeat(PUBLIC_ID_LEN - 1)));
        assert_eq!(encode(u128::MAX).len(), PUBLIC_ID_LEN);
    }

    #[test]
    fn test_is_valid_rejects_upper_case() {
        assert!(!is_valid("0123456789ABCDEFGHIJKLMNO"));
        assert!(is_valid("0123456789abcdefghijklmno"));
        assert!(!is_valid("short"));
    }
}
