/// Parses a byte written either in decimal or as `0x` prefixed hex.
pub fn parse_number(text: &str) -> Option<u8> {
    let text = text.trim();

    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Formats bytes as space separated hex pairs, e.g. `04 00`.
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    #[test]
    fn parse_number() {
        assert_eq!(super::parse_number("64"), Some(64));
        assert_eq!(super::parse_number("0x40"), Some(0x40));
        assert_eq!(super::parse_number(" 0XfF "), Some(0xFF));
        assert_eq!(super::parse_number("256"), None);
        assert_eq!(super::parse_number("0x100"), None);
        assert_eq!(super::parse_number("0x"), None);
        assert_eq!(super::parse_number("-1"), None);
        assert_eq!(super::parse_number(""), None);
    }

    #[test]
    fn hex_bytes() {
        assert_eq!(super::hex_bytes(&[0x04, 0x00, 0xBE]), "04 00 be");
        assert_eq!(super::hex_bytes(&[]), "");
    }
}
