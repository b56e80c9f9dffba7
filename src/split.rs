//! The `Prefix_N` instance-number convention.

use crate::name::name_external_to_internal;

/// Suffixes longer than this are kept as part of the text.
pub const MAX_SUFFIX_DIGITS: usize = 10;

/// Splits a trailing `_N` off `text`.
///
/// Returns the prefix and the internal number (`N + 1`). The suffix is only
/// split when all of these hold:
///
/// - it is an underscore followed by at least one ASCII digit,
/// - the digits do not start with `0` (`Rocket_0` and `Rocket_04` stay literal),
/// - there are at most [`MAX_SUFFIX_DIGITS`] digits and `N + 1` fits in a `u32`,
/// - the prefix before the underscore is not empty.
pub fn split_number(text: &str) -> Option<(&str, u32)> {
    let bytes = text.as_bytes();

    let digits = bytes.iter().rev().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > MAX_SUFFIX_DIGITS {
        return None;
    }

    let underscore = bytes.len().checked_sub(digits + 1)?;
    if underscore == 0 || bytes[underscore] != b'_' {
        return None;
    }

    let suffix = &text[underscore + 1..];
    if suffix.starts_with('0') {
        return None;
    }

    let value: u64 = suffix.parse().ok()?;
    if value >= u32::MAX as u64 {
        return None;
    }

    Some((&text[..underscore], name_external_to_internal(value as u32)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_plain_suffixes() {
        assert_eq!(split_number("Rocket_17"), Some(("Rocket", 18)));
        assert_eq!(split_number("Rocket_1"), Some(("Rocket", 2)));
        assert_eq!(split_number("Rocket_10"), Some(("Rocket", 11)));
        assert_eq!(split_number("A_B_3"), Some(("A_B", 4)));
        assert_eq!(split_number("Rocket__3"), Some(("Rocket_", 4)));
    }

    #[test]
    fn leading_zeros_stay_literal() {
        assert_eq!(split_number("Rocket_0"), None);
        assert_eq!(split_number("Rocket_04"), None);
        assert_eq!(split_number("Rocket_00"), None);
    }

    #[test]
    fn needs_underscore_prefix_and_digits() {
        assert_eq!(split_number("Rocket17"), None);
        assert_eq!(split_number("Rocket_"), None);
        assert_eq!(split_number("_17"), None);
        assert_eq!(split_number("17"), None);
        assert_eq!(split_number(""), None);
        assert_eq!(split_number("Rocket_1x"), None);
    }

    #[test]
    fn suffix_must_fit_in_u32() {
        assert_eq!(split_number("Big_4294967294"), Some(("Big", u32::MAX)));
        assert_eq!(split_number("Big_4294967295"), None);
        assert_eq!(split_number("Big_99999999999"), None);
    }

    #[test]
    fn non_ascii_prefix() {
        assert_eq!(split_number("Größe_2"), Some(("Größe", 3)));
    }

    proptest! {
        #[test]
        fn split_then_format_round_trips(text in "[A-Za-z_]{1,8}(_[0-9]{1,4})?") {
            if let Some((prefix, number)) = split_number(&text) {
                prop_assert!(!prefix.is_empty());
                prop_assert_eq!(format!("{}_{}", prefix, number - 1), text);
            }
        }

        #[test]
        fn canonical_suffixes_always_split(prefix in "[A-Za-z][A-Za-z0-9]{0,8}", n in 0u32..1_000_000) {
            let text = format!("{prefix}_{n}");
            let split = split_number(&text);
            if n == 0 {
                prop_assert_eq!(split, None);
            } else {
                prop_assert_eq!(split, Some((prefix.as_str(), n + 1)));
            }
        }
    }
}
