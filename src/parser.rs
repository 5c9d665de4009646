use nom::{
    bytes::complete::take_while_m_n,
    character::is_digit,
    combinator::map,
    multi::length_data,
    sequence::pair,
    Finish, IResult,
};

use crate::{
    error::{Error, Result},
    protocol::*,
};

/// Parse two ascii digits as a number
fn two_digits(input: &[u8]) -> IResult<&[u8], u8> {
    map(take_while_m_n(2, 2, is_digit), |digits: &[u8]| {
        (digits[0] - b'0') * 10 + (digits[1] - b'0')
    })(input)
}

/// Parse a field identifier
pub fn tag_id(input: &[u8]) -> IResult<&[u8], Tag> {
    map(two_digits, Tag::from)(input)
}

/// Parse a value length prefix
pub fn length(input: &[u8]) -> IResult<&[u8], usize> {
    map(two_digits, usize::from)(input)
}

/// Parse a whole field
///
/// Takes a `&[u8]`: two digit tag, two digit `length` and `length` bytes of value
pub fn field(input: &[u8]) -> IResult<&[u8], (Tag, &[u8])> {
    pair(tag_id, length_data(length))(input)
}

fn hex_checksum(value: &[u8]) -> Option<u16> {
    if value.len() != 4 || !value.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u16::from_str_radix(std::str::from_utf8(value).ok()?, 16).ok()
}

/// Locate the step that made [`field`] fail on `input`, which starts at `offset`
fn field_error(input: &[u8], offset: usize) -> Error {
    let Ok((after_tag, tag)) = tag_id(input) else {
        return Error::malformed(None, offset, "tag is not two digits");
    };
    match length(after_tag) {
        Ok((after_len, len)) => Error::malformed(
            Some(tag),
            offset + 4,
            format!("length {len} exceeds the {} remaining bytes", after_len.len()),
        ),
        Err(_) => Error::malformed(Some(tag), offset + 2, "length is not two digits"),
    }
}

/// Walk a payload without failing on a checksum mismatch
///
/// Surrounding ascii whitespace is ignored. The returned payload reports the
/// outcome of the checksum comparison in [`ParsedPayload::checksum_valid`].
///
/// # Errors
///
/// [`Error::MalformedPayload`] when the walk cannot reach a well formed
/// checksum field that ends the input.
pub fn parse_payload(payload: &str) -> Result<ParsedPayload> {
    let input = payload.trim_matches(|c: char| c.is_ascii_whitespace()).as_bytes();
    let mut rest = input;
    let mut fields = vec![];

    loop {
        let offset = input.len() - rest.len();
        if rest.is_empty() {
            return Err(Error::malformed(None, offset, "missing checksum field"));
        }

        let (after_value, (tag, value)) = field(rest)
            .finish()
            .map_err(|_| field_error(rest, offset))?;

        if tag == Tag::Crc {
            let found = hex_checksum(value).ok_or_else(|| {
                Error::malformed(Some(tag), offset + 4, "checksum is not four hex digits")
            })?;
            if !after_value.is_empty() {
                return Err(Error::malformed(
                    Some(tag),
                    input.len() - after_value.len(),
                    "trailing data after checksum",
                ));
            }

            let expected = crate::crc16_ccitt(&input[..offset + 4]);
            log::trace!("checksum field: found {found:04x}, computed {expected:04x}");
            return Ok(ParsedPayload {
                fields,
                checksum: found,
                checksum_valid: found == expected,
            });
        }

        let value = std::str::from_utf8(value)
            .map_err(|_| Error::malformed(Some(tag), offset + 4, "value is not valid utf-8"))?;
        log::trace!("field {tag}: {} bytes", value.len());
        fields.push(Field::new(tag, value));
        rest = after_value;
    }
}

/// Parse a payload and verify its checksum
///
/// # Errors
///
/// [`Error::MalformedPayload`] as in [`parse_payload`], [`Error::ChecksumMismatch`]
/// when the trailer does not match the checksum over everything up to and including `6304`.
pub fn decode(payload: &str) -> Result<ParsedPayload> {
    let parsed = parse_payload(payload)?;
    if !parsed.checksum_valid {
        let input = payload.trim_matches(|c: char| c.is_ascii_whitespace());
        let expected = crate::crc16_ccitt(&input.as_bytes()[..input.len() - 4]);
        log::debug!(
            "rejecting payload with {} fields: checksum {:04x} != {expected:04x}",
            parsed.fields.len(),
            parsed.checksum
        );
        return Err(Error::ChecksumMismatch {
            expected,
            found: parsed.checksum,
        });
    }
    log::debug!("decoded payload with {} fields", parsed.fields.len());
    Ok(parsed)
}

impl<'a> TryFrom<&'a str> for ParsedPayload {
    type Error = Error;

    fn try_from(value: &'a str) -> Result<Self> {
        decode(value)
    }
}

impl std::str::FromStr for ParsedPayload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}
