use std::{fmt, str::FromStr};

use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ValidationError};

/// Country code the original vendor records default to
pub const KENYA_COUNTRY_CODE: &str = "KE";
/// ISO 4217 numeric code for the Kenyan shilling
pub const KES_CURRENCY_CODE: &str = "404";

/// Largest value length expressible by the two digit length prefix
pub const MAX_FIELD_LEN: usize = 99;

/// Field identifier
///
/// | Tag | Field                      |
/// |-----|----------------------------|
/// | 00  | Payload format indicator   |
/// | 01  | Point of initiation method |
/// | 02  | Merchant account (Till, Paybill, Pochi) |
/// | 52  | Merchant category code     |
/// | 53  | Transaction currency       |
/// | 54  | Transaction amount         |
/// | 58  | Country code               |
/// | 59  | Merchant name              |
/// | 60  | Merchant city / store label |
/// | 61  | Postal code                |
/// | 62  | Additional data (reference number) |
/// | 63  | CRC                        |
///
/// Any other two digit id is kept as [`Tag::Other`].
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(from = "u8", into = "u8"))]
pub enum Tag {
    PayloadFormatIndicator,
    PointOfInitiation,
    MerchantAccount,
    MerchantCategoryCode,
    TransactionCurrency,
    TransactionAmount,
    CountryCode,
    MerchantName,
    MerchantCity,
    PostalCode,
    AdditionalData,
    Crc,
    Other(u8),
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::PayloadFormatIndicator,
            1 => Self::PointOfInitiation,
            2 => Self::MerchantAccount,
            52 => Self::MerchantCategoryCode,
            53 => Self::TransactionCurrency,
            54 => Self::TransactionAmount,
            58 => Self::CountryCode,
            59 => Self::MerchantName,
            60 => Self::MerchantCity,
            61 => Self::PostalCode,
            62 => Self::AdditionalData,
            63 => Self::Crc,
            other => Self::Other(other),
        }
    }
}

impl From<Tag> for u8 {
    fn from(value: Tag) -> Self {
        match value {
            Tag::PayloadFormatIndicator => 0,
            Tag::PointOfInitiation => 1,
            Tag::MerchantAccount => 2,
            Tag::MerchantCategoryCode => 52,
            Tag::TransactionCurrency => 53,
            Tag::TransactionAmount => 54,
            Tag::CountryCode => 58,
            Tag::MerchantName => 59,
            Tag::MerchantCity => 60,
            Tag::PostalCode => 61,
            Tag::AdditionalData => 62,
            Tag::Crc => 63,
            Tag::Other(id) => id,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", u8::from(*self))
    }
}

/// A single tag-length-value entry
///
/// The length is not stored, it is always the byte length of `value`.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Field {
    pub tag: Tag,
    pub value: String,
}

impl Field {
    pub fn new(tag: Tag, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Appends `tag + length + value` to `out`
    ///
    /// # Errors
    ///
    /// [`Error::FieldTooLong`] when the value is longer than [`MAX_FIELD_LEN`] bytes,
    /// in which case `out` is left untouched.
    pub fn render_into(&self, out: &mut String) -> Result<()> {
        let len = self.value.len();
        if len > MAX_FIELD_LEN {
            return Err(Error::FieldTooLong { tag: self.tag, len });
        }
        out.push_str(&format!("{}{:02}{}", self.tag, len, self.value));
        Ok(())
    }
}

/// Whether the payer enters the amount or it comes pre-filled
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum PayloadKind {
    /// Reusable, no embedded amount. Point of initiation `11`
    Static,
    /// Amount pre-filled. Point of initiation `12`
    Dynamic,
}

impl PayloadKind {
    pub fn point_of_initiation(&self) -> &'static str {
        match self {
            Self::Static => "11",
            Self::Dynamic => "12",
        }
    }

    pub fn from_point_of_initiation(value: &str) -> Option<Self> {
        match value {
            "11" => Some(Self::Static),
            "12" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

/// Strictly positive transaction amount
///
/// Rendered exactly as the underlying decimal prints, so `150` stays `"150"`
/// and `150.50` stays `"150.50"`.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Decimal", into = "Decimal")
)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> std::result::Result<Self, ValidationError> {
        if value.is_zero() || value.is_sign_negative() {
            return Err(ValidationError::NonPositiveAmount(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<u64> for Amount {
    type Error = ValidationError;

    fn try_from(value: u64) -> std::result::Result<Self, Self::Error> {
        Self::new(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = Decimal::from_str(s).map_err(|_| ValidationError::InvalidFormat {
            field: "amount",
            reason: "not a decimal number",
        })?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Merchant record supplied by the host application
#[derive(Debug, PartialEq, Eq, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MerchantAttributes {
    /// Displayed to the payer, bounded by [`EncoderOptions`][crate::EncoderOptions]
    pub name: String,
    /// Till, Paybill or Pochi number
    pub business_code: String,
    /// Four digits, `0000` when absent
    pub category_code: Option<String>,
    /// ISO 4217 numeric, three digits
    pub currency_code: String,
    /// ISO 3166 alpha-2
    pub country_code: String,
    /// Store location, rendered as merchant city
    pub store_label: Option<String>,
}

impl MerchantAttributes {
    pub fn new(
        name: impl Into<String>,
        business_code: impl Into<String>,
        currency_code: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            business_code: business_code.into(),
            currency_code: currency_code.into(),
            country_code: country_code.into(),
            ..Default::default()
        }
    }

    pub fn with_category_code(mut self, category_code: impl Into<String>) -> Self {
        self.category_code = Some(category_code.into());
        self
    }

    pub fn with_store_label(mut self, store_label: impl Into<String>) -> Self {
        self.store_label = Some(store_label.into());
        self
    }
}

/// Per-payload data, everything optional
#[derive(Debug, PartialEq, Eq, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PaymentContext {
    pub amount: Option<Amount>,
    /// ASCII alphanumeric transaction reference
    pub reference: Option<String>,
}

impl PaymentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn kind(&self) -> PayloadKind {
        match self.amount {
            Some(_) => PayloadKind::Dynamic,
            None => PayloadKind::Static,
        }
    }
}

/// Complete payload text, checksum trailer included
///
/// Only produced by the encoder or by a successful checksum-verified parse,
/// so it can be stored verbatim and handed to a renderer. The trailer is
/// always `6304` followed by four lowercase hex digits.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(into = "String"))]
pub struct EncodedPayload {
    payload: String,
    kind: PayloadKind,
}

impl EncodedPayload {
    pub(crate) fn new(payload: String, kind: PayloadKind) -> Self {
        Self { payload, kind }
    }

    pub fn as_str(&self) -> &str {
        &self.payload
    }

    pub fn into_string(self) -> String {
        self.payload
    }

    /// Taken from the point of initiation field
    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// The four lowercase hex digits at the end of the payload
    pub fn checksum(&self) -> &str {
        &self.payload[self.payload.len() - 4..]
    }

    pub fn parse(&self) -> Result<ParsedPayload> {
        crate::parser::decode(&self.payload)
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

impl AsRef<str> for EncodedPayload {
    fn as_ref(&self) -> &str {
        &self.payload
    }
}

impl From<EncodedPayload> for String {
    fn from(value: EncodedPayload) -> Self {
        value.payload
    }
}

/// Accepts a previously persisted payload after a full checksum-verified parse
///
/// Surrounding whitespace is dropped and an uppercase checksum is rewritten in lowercase.
///
/// # Errors
///
/// Anything [`decode`][crate::decode] rejects, and [`ValidationError::InvalidFormat`]
/// when the point of initiation is missing or neither `11` nor `12`.
impl TryFrom<String> for EncodedPayload {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        let trimmed = value.trim_matches(|c: char| c.is_ascii_whitespace());
        let parsed = crate::parser::decode(trimmed)?;
        let kind = parsed.kind().ok_or(ValidationError::InvalidFormat {
            field: "point_of_initiation",
            reason: "must be 11 or 12",
        })?;

        let body = &trimmed[..trimmed.len() - 4];
        let payload = format!("{body}{:04x}", parsed.checksum);
        Ok(Self::new(payload, kind))
    }
}

/// Fields recovered from a payload string
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedPayload {
    /// Every field before the checksum, in wire order
    pub fields: Vec<Field>,
    /// Checksum carried by the payload
    pub checksum: u16,
    /// Whether [`checksum`][Self::checksum] matches the recomputed one
    pub checksum_valid: bool,
}

impl ParsedPayload {
    /// Value of the first field with `tag`
    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.tag == tag)
            .map(|field| field.value.as_str())
    }

    pub fn kind(&self) -> Option<PayloadKind> {
        self.get(Tag::PointOfInitiation)
            .and_then(PayloadKind::from_point_of_initiation)
    }

    pub fn amount(&self) -> std::result::Result<Option<Amount>, ValidationError> {
        self.get(Tag::TransactionAmount)
            .map(Amount::from_str)
            .transpose()
    }

    pub fn reference(&self) -> Option<&str> {
        self.get(Tag::AdditionalData)
    }

    /// Rebuild the merchant record the payload was encoded from
    ///
    /// An empty store label comes back as `None`, a `0000` category code as `Some("0000")`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Required`] when a mandatory merchant field is absent.
    pub fn merchant_attributes(&self) -> std::result::Result<MerchantAttributes, ValidationError> {
        let required = |tag, field| {
            self.get(tag)
                .map(str::to_owned)
                .ok_or(ValidationError::Required { field })
        };

        Ok(MerchantAttributes {
            name: required(Tag::MerchantName, "name")?,
            business_code: required(Tag::MerchantAccount, "business_code")?,
            category_code: self.get(Tag::MerchantCategoryCode).map(str::to_owned),
            currency_code: required(Tag::TransactionCurrency, "currency_code")?,
            country_code: required(Tag::CountryCode, "country_code")?,
            store_label: self
                .get(Tag::MerchantCity)
                .filter(|label| !label.is_empty())
                .map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_display_is_two_digits() {
        assert_eq!(Tag::PayloadFormatIndicator.to_string(), "00");
        assert_eq!(Tag::Crc.to_string(), "63");
        assert_eq!(Tag::Other(7).to_string(), "07");
    }

    #[test]
    fn tag_from_u8() {
        assert_eq!(Tag::from(59), Tag::MerchantName);
        assert_eq!(Tag::from(26), Tag::Other(26));
        assert_eq!(u8::from(Tag::TransactionAmount), 54);
    }

    #[test]
    fn render_field() {
        let mut out = String::new();
        Field::new(Tag::CountryCode, "KE").render_into(&mut out).unwrap();
        Field::new(Tag::MerchantCity, "").render_into(&mut out).unwrap();
        assert_eq!(out, "5802KE6000");
    }

    #[test]
    fn render_field_counts_bytes() {
        let mut out = String::new();
        Field::new(Tag::MerchantName, "Café").render_into(&mut out).unwrap();
        assert_eq!(out, "5905Café");
    }

    #[test]
    fn render_field_too_long() {
        let mut out = String::from("prefix");
        let err = Field::new(Tag::AdditionalData, "x".repeat(100))
            .render_into(&mut out)
            .unwrap_err();
        assert_eq!(
            err,
            Error::FieldTooLong {
                tag: Tag::AdditionalData,
                len: 100
            }
        );
        assert_eq!(out, "prefix");
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(Amount::try_from(0u64).is_err());
        assert!("-5".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert_eq!(Amount::try_from(150u64).unwrap().to_string(), "150");
        assert_eq!("150.50".parse::<Amount>().unwrap().to_string(), "150.50");
    }

    #[test]
    fn point_of_initiation() {
        assert_eq!(PayloadKind::Static.point_of_initiation(), "11");
        assert_eq!(
            PayloadKind::from_point_of_initiation("12"),
            Some(PayloadKind::Dynamic)
        );
        assert_eq!(PayloadKind::from_point_of_initiation("13"), None);
    }
}
