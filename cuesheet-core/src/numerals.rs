//! Conversion of Bengali decimal digits to ASCII digits.

use serde_json::Value;

const BENGALI_ZERO: u32 = '\u{09E6}' as u32;

/// Maps a single Bengali digit (`০`..`৯`) to its ASCII counterpart
pub fn ascii_digit(c: char) -> Option<char> {
    let offset = (c as u32).checked_sub(BENGALI_ZERO)?;

    if offset < 10 {
        char::from_digit(offset, 10)
    } else {
        None
    }
}

/// Returns true if the string is non-empty and made only of Bengali digits
pub fn is_localized_numeric(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| ascii_digit(c).is_some())
}

/// Normalizes a serial label. A string of Bengali digits becomes the same
/// number written in ASCII digits, anything else is returned as is.
pub fn normalize_digits(input: &str) -> String {
    if is_localized_numeric(input) {
        input.chars().filter_map(ascii_digit).collect()
    } else {
        input.to_string()
    }
}

/// [normalize_digits] for arbitrary JSON input. Non-string values pass
/// through untouched.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_digits(&s)),
        other => other,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_bengali_digit_maps() {
        let bengali = "০১২৩৪৫৬৭৮৯";

        assert_eq!(normalize_digits(bengali), "0123456789");
        assert_eq!(normalize_digits(bengali).chars().count(), bengali.chars().count());
    }

    #[test]
    fn mixed_input_is_unchanged() {
        for input in ["১২a", "12", "১ ২", "১২-৩", "abc", ""] {
            assert_eq!(normalize_digits(input), input);
        }
    }

    #[test]
    fn neighbouring_code_points_are_not_digits() {
        assert_eq!(ascii_digit('\u{09E5}'), None);
        assert_eq!(ascii_digit('\u{09F0}'), None);
        assert_eq!(ascii_digit('৭'), Some('7'));
        assert_eq!(ascii_digit('7'), None);
    }

    #[test]
    fn non_strings_pass_through() {
        assert_eq!(normalize_value(json!(12)), json!(12));
        assert_eq!(normalize_value(json!(null)), json!(null));
        assert_eq!(normalize_value(json!("০৫")), json!("05"));
    }
}
