#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, ValidationError},
    protocol::*,
};

const PAYLOAD_FORMAT_INDICATOR: &str = "01";
const DEFAULT_CATEGORY_CODE: &str = "0000";
const DEFAULT_POSTAL_CODE: &str = "00";
const DEFAULT_MAX_NAME_LEN: usize = 25;
const CHECKSUM_PREFIX: &str = "6304";

/// What to do with a merchant name longer than [`EncoderOptions::max_name_len`]
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum NameOverflow {
    /// Fail with [`ValidationError::TooLong`]
    #[default]
    Reject,
    /// Cut at the last character boundary that fits
    Truncate,
}

/// Encoder configuration
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EncoderOptions {
    /// Maximum merchant name length in bytes, 25 by default
    pub max_name_len: usize,
    pub name_overflow: NameOverflow,
    /// Tag 61 value
    pub postal_code: String,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
            name_overflow: NameOverflow::default(),
            postal_code: DEFAULT_POSTAL_CODE.to_owned(),
        }
    }
}

impl EncoderOptions {
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    pub fn with_name_overflow(mut self, name_overflow: NameOverflow) -> Self {
        self.name_overflow = name_overflow;
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = postal_code.into();
        self
    }
}

/// Builds checksummed payloads from merchant records
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncoderOptions,
}

impl Encoder {
    /// Creates a new [`Encoder`] with the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Encoder`] with custom options.
    pub fn with_options(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Encodes a merchant and an optional amount and reference into a payload.
    ///
    /// Fields are always emitted in the same order, so identical input gives
    /// byte identical output.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] for missing or badly formatted input,
    /// [`Error::FieldTooLong`][crate::Error::FieldTooLong] when a value does not fit
    /// its length prefix.
    pub fn encode(
        &self,
        merchant: &MerchantAttributes,
        payment: &PaymentContext,
    ) -> Result<EncodedPayload> {
        let fields = self.fields(merchant, payment)?;

        let mut payload = String::with_capacity(128);
        for field in &fields {
            log::trace!("rendering field {}", field.tag);
            field.render_into(&mut payload)?;
        }
        payload.push_str(CHECKSUM_PREFIX);
        let checksum = crate::checksum(payload.as_bytes());
        payload.push_str(&checksum);

        log::debug!(
            "encoded {:?} payload for {} with {} fields ({} bytes)",
            payment.kind(),
            merchant.business_code,
            fields.len() + 1,
            payload.len()
        );
        Ok(EncodedPayload::new(payload, payment.kind()))
    }

    /// Permanent storefront payload, the payer enters the amount.
    pub fn merchant_payload(&self, merchant: &MerchantAttributes) -> Result<EncodedPayload> {
        self.encode(merchant, &PaymentContext::new())
    }

    /// Payload with a fixed amount and no reference, e.g. parking fees or tickets.
    pub fn fixed_amount_payload(
        &self,
        merchant: &MerchantAttributes,
        amount: Amount,
    ) -> Result<EncodedPayload> {
        self.encode(merchant, &PaymentContext::new().with_amount(amount))
    }

    /// Single transaction payload with an amount and an optional reference.
    pub fn transaction_payload(
        &self,
        merchant: &MerchantAttributes,
        amount: Amount,
        reference: Option<&str>,
    ) -> Result<EncodedPayload> {
        let mut payment = PaymentContext::new().with_amount(amount);
        payment.reference = reference.map(str::to_owned);
        self.encode(merchant, &payment)
    }

    /// Validated field list in wire order, checksum excluded
    pub fn fields(
        &self,
        merchant: &MerchantAttributes,
        payment: &PaymentContext,
    ) -> std::result::Result<Vec<Field>, ValidationError> {
        validate_merchant(merchant)?;
        let name = self.merchant_name(&merchant.name)?;
        let reference = payment.reference.as_deref().filter(|r| !is_blank(r));
        if let Some(reference) = reference {
            validate_reference(reference)?;
        }

        let mut fields = vec![
            Field::new(Tag::PayloadFormatIndicator, PAYLOAD_FORMAT_INDICATOR),
            Field::new(Tag::PointOfInitiation, payment.kind().point_of_initiation()),
            Field::new(Tag::MerchantAccount, merchant.business_code.as_str()),
            Field::new(
                Tag::MerchantCategoryCode,
                category_code(merchant).unwrap_or(DEFAULT_CATEGORY_CODE),
            ),
            Field::new(Tag::TransactionCurrency, merchant.currency_code.as_str()),
            Field::new(Tag::CountryCode, merchant.country_code.as_str()),
            Field::new(Tag::MerchantName, name),
            Field::new(
                Tag::MerchantCity,
                merchant.store_label.as_deref().unwrap_or_default(),
            ),
            Field::new(Tag::PostalCode, self.options.postal_code.as_str()),
        ];
        if let Some(amount) = &payment.amount {
            fields.push(Field::new(Tag::TransactionAmount, amount.to_string()));
        }
        if let Some(reference) = reference {
            fields.push(Field::new(Tag::AdditionalData, reference));
        }
        Ok(fields)
    }

    fn merchant_name<'a>(&self, name: &'a str) -> std::result::Result<&'a str, ValidationError> {
        let max = self.options.max_name_len;
        if name.len() <= max {
            return Ok(name);
        }
        match self.options.name_overflow {
            NameOverflow::Reject => Err(ValidationError::TooLong {
                field: "name",
                len: name.len(),
                max,
            }),
            NameOverflow::Truncate => {
                let mut end = max;
                while !name.is_char_boundary(end) {
                    end -= 1;
                }
                log::warn!("truncating merchant name from {} to {end} bytes", name.len());
                Ok(&name[..end])
            }
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Blank counts as absent
fn category_code(merchant: &MerchantAttributes) -> Option<&str> {
    merchant
        .category_code
        .as_deref()
        .filter(|code| !is_blank(code))
}

fn validate_merchant(merchant: &MerchantAttributes) -> std::result::Result<(), ValidationError> {
    let required = [
        ("name", &merchant.name),
        ("business_code", &merchant.business_code),
        ("country_code", &merchant.country_code),
        ("currency_code", &merchant.currency_code),
    ];
    for (field, value) in required {
        if is_blank(value) {
            return Err(ValidationError::Required { field });
        }
    }

    if !merchant.business_code.is_ascii() {
        return Err(ValidationError::InvalidFormat {
            field: "business_code",
            reason: "must be ascii",
        });
    }
    if !is_digits(&merchant.currency_code, 3) {
        return Err(ValidationError::InvalidFormat {
            field: "currency_code",
            reason: "must be 3 digits",
        });
    }
    if merchant.country_code.len() != 2
        || !merchant.country_code.bytes().all(|b| b.is_ascii_alphabetic())
    {
        return Err(ValidationError::InvalidFormat {
            field: "country_code",
            reason: "must be 2 letters",
        });
    }
    if let Some(category_code) = category_code(merchant) {
        if !is_digits(category_code, 4) {
            return Err(ValidationError::InvalidFormat {
                field: "category_code",
                reason: "must be 4 digits",
            });
        }
    }
    Ok(())
}

fn validate_reference(reference: &str) -> std::result::Result<(), ValidationError> {
    if !reference.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "reference",
            reason: "must be ascii alphanumeric",
        });
    }
    Ok(())
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Encodes with the default [`EncoderOptions`]
///
/// Point of initiation becomes `12` and tag `54` is emitted when `amount` is given.
/// Tag `62` is emitted when a non-blank `reference` is given.
pub fn encode(
    merchant: &MerchantAttributes,
    amount: Option<Amount>,
    reference: Option<&str>,
) -> Result<EncodedPayload> {
    let payment = PaymentContext {
        amount,
        reference: reference.map(str::to_owned),
    };
    Encoder::new().encode(merchant, &payment)
}
