/// Conversion between puzzle strings and their single-byte wire form
use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use crate::error::{PuzError, Result};

/// Every byte maps to exactly one character, so decoding never fails
/// and re-encoding the result gives back the original bytes.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

pub fn encode_text(text: &str) -> Result<Cow<'_, [u8]>> {
    if text.contains('\0') {
        return Err(PuzError::UnencodableText(text.to_string()));
    }

    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        return Err(PuzError::UnencodableText(text.to_string()));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copyright_sign_is_one_byte() {
        let encoded = encode_text("Example Games © 2025").unwrap();
        assert_eq!(encoded.len(), 20);
        assert_eq!(encoded[14], 0xA9);
        assert_eq!(decode_text(&encoded), "Example Games © 2025");
    }

    #[test]
    fn test_every_byte_survives() {
        let all: Vec<u8> = (1..=255).collect();
        let text = decode_text(&all);
        assert_eq!(encode_text(&text).unwrap().as_ref(), all.as_slice());
    }

    #[test]
    fn test_rejects_nul_and_unmappable() {
        assert!(matches!(
            encode_text("a\0b"),
            Err(PuzError::UnencodableText(_))
        ));
        assert!(matches!(
            encode_text("snow ☃"),
            Err(PuzError::UnencodableText(_))
        ));
    }
}
