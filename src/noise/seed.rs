//! String seed hashing.

/// Hashes a textual seed into the 32-bit integer that drives all noise.
///
/// Folds over the UTF-16 code units of `seed` with `acc * 31 + unit`,
/// wrapping to a signed 32-bit value at every step. The empty string
/// hashes to 0.
pub fn hash_seed(seed: &str) -> i32 {
    seed.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(unit as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_seed_hashes_to_zero() {
        assert_eq!(hash_seed(""), 0);
    }

    #[test]
    fn test_known_values() {
        // Same fold as Java's String::hashCode.
        assert_eq!(hash_seed("a"), 97);
        assert_eq!(hash_seed("ab"), 97 * 31 + 98);
        assert_eq!(hash_seed("hello"), 99162322);
    }

    #[test]
    fn test_long_seed_wraps() {
        let seed = "planet-test-1-with-a-long-suffix-that-overflows-i32";
        let expected = seed
            .encode_utf16()
            .fold(0i64, |acc, u| ((acc * 31 + u as i64) as i32) as i64) as i32;
        assert_eq!(hash_seed(seed), expected);
    }

    #[test]
    fn test_hash_is_stable() {
        let a = hash_seed("planet-test-1");
        let b = hash_seed("planet-test-1");
        assert_eq!(a, b);
        assert_ne!(a, hash_seed("planet-test-2"));
    }

    #[test]
    fn test_non_ascii_uses_utf16_units() {
        // U+1F30D is a surrogate pair in UTF-16.
        let s = "\u{1F30D}";
        let units: Vec<u16> = s.encode_utf16().collect();
        assert_eq!(units.len(), 2);
        let expected = (units[0] as i32).wrapping_mul(31).wrapping_add(units[1] as i32);
        assert_eq!(hash_seed(s), expected);
    }
}
