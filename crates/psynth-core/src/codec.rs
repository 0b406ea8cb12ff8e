//! Reversible text codec for the wire boundary.
//!
//! Every text field is percent-encoded when an entity is serialized into a
//! request document and percent-decoded exactly once when an entity is built
//! from raw parameters, so `decode(encode(s)) == s` for any string.

/// Percent-encode a text field for transmission.
pub fn encode(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// Percent-decode a text field received from a caller or the server.
///
/// Escapes that do not form valid UTF-8 are replaced rather than rejected;
/// stray `%` characters that are not followed by two hex digits are kept.
pub fn decode(text: &str) -> String {
    match urlencoding::decode(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(text.as_bytes())).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reserved_characters() {
        assert_eq!(encode("My Graph"), "My%20Graph");
        assert_eq!(encode("a/b?c=d&e"), "a%2Fb%3Fc%3Dd%26e");
        assert_eq!(encode("#1aa2d4"), "%231aa2d4");
    }

    #[test]
    fn test_decode_plain_text_is_identity() {
        assert_eq!(decode("Node"), "Node");
        assert_eq!(decode("b8e1241a-c90c-46ca-a55e-6cbb9145ab19"), "b8e1241a-c90c-46ca-a55e-6cbb9145ab19");
    }

    #[test]
    fn test_decode_keeps_plus_and_stray_percent() {
        assert_eq!(decode("a+b"), "a+b");
        assert_eq!(decode("100%"), "100%");
    }

    #[test]
    fn test_unicode_survives_the_wire() {
        let text = "Grüße, 世界 & \"quotes\"";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn test_invalid_utf8_escape_is_lossy() {
        assert_eq!(decode("%FFok"), "\u{FFFD}ok");
    }
}
