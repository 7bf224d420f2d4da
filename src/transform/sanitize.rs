//! Tag value sanitizer.

/// Characters the time-series backends reject in tag values.
pub const INVALID_TAG_CHARS: [char; 6] = ['?', '@', ':', '=', '[', ']'];

/// Substitute for every invalid character.
pub const REPLACEMENT_CHAR: char = '_';

/// Replace every invalid tag character with `_`.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if INVALID_TAG_CHARS.contains(&c) {
                REPLACEMENT_CHAR
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_every_invalid_char() {
        assert_eq!(sanitize("a?b@c:d=e[f]g"), "a_b_c_d_e_f_g");
        assert_eq!(sanitize("[[::]]"), "______");
    }

    #[test]
    fn test_clean_values_untouched() {
        assert_eq!(sanitize("i-123.eu_central"), "i-123.eu_central");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_output_never_contains_invalid_chars() {
        let inputs = [
            "http://host:8080/path?x=1",
            "arn:aws:iam::123:role/[admin]",
            "user@example.org",
            "ümlaut=ok?",
        ];
        for input in inputs {
            let out = sanitize(input);
            assert!(
                !out.chars().any(|c| INVALID_TAG_CHARS.contains(&c)),
                "{input} -> {out}"
            );
            assert_eq!(out.chars().count(), input.chars().count());
        }
    }
}
