#![doc = include_str!("../README.md")]
mod encoder;
mod error;
mod metadata;
mod protocol;
mod render;
pub mod parser;

pub use encoder::*;
pub use error::*;
pub use metadata::*;
pub use parser::{decode, parse_payload};
pub use protocol::*;
pub use render::*;

/// CRC-16/CCITT-FALSE Algorithm
///
/// Uses 0x1021 polynomial, 0xFFFF initial register, no reflection and no final xor
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _bit in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Payload checksum as four lowercase hex digits
pub fn checksum(data: &[u8]) -> String {
    format!("{:04x}", crc16_ccitt(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_check_value() {
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_crc16_empty() {
        assert_eq!(crc16_ccitt(&[]), 0xFFFF);
        assert_eq!(checksum(b""), "ffff");
    }

    #[test]
    fn test_crc16_binary() {
        let input = hex::decode("313233343536373839").unwrap();
        assert_eq!(checksum(&input), "29b1");
    }

    #[test]
    fn test_checksum_payload() {
        let input = "00020101021102061743795204541153034045802KE5912Acme Traders6007Nairobi6102006304";
        assert_eq!(checksum(input.as_bytes()), "a58c");
    }

    #[test]
    fn test_checksum_is_zero_padded() {
        for i in 0..=u8::MAX {
            assert_eq!(checksum(&[i]).len(), 4);
        }
    }
}
