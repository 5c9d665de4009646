use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result, ValidationError},
    protocol::*,
};

/// Searchable summary stored next to an opaque payload
///
/// Built from the payload itself, so it can never disagree with what the payer scans.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PayloadMetadata {
    pub kind: PayloadKind,
    pub business_code: String,
    pub merchant_name: String,
    pub currency_code: String,
    pub amount: Option<Amount>,
    pub reference: Option<String>,
    /// In Utc
    pub generated_at: DateTime<Utc>,
}

impl PayloadMetadata {
    /// Summarise a verified payload, stamped with `generated_at`
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when a merchant field, the point of initiation or
    /// the amount is missing or unreadable.
    pub fn from_parsed(parsed: &ParsedPayload, generated_at: DateTime<Utc>) -> Result<Self> {
        let kind = parsed.kind().ok_or(ValidationError::InvalidFormat {
            field: "point_of_initiation",
            reason: "must be 11 or 12",
        })?;
        let merchant = parsed.merchant_attributes()?;

        Ok(Self {
            kind,
            business_code: merchant.business_code,
            merchant_name: merchant.name,
            currency_code: merchant.currency_code,
            amount: parsed.amount()?,
            reference: parsed.reference().map(str::to_owned),
            generated_at,
        })
    }

    /// Same as [`from_parsed`][Self::from_parsed] for a payload this crate produced
    pub fn from_payload(payload: &EncodedPayload, generated_at: DateTime<Utc>) -> Result<Self> {
        Self::from_parsed(&payload.parse()?, generated_at)
    }

    /// Stamped with the current time
    pub fn now(payload: &EncodedPayload) -> Result<Self> {
        Self::from_payload(payload, Utc::now())
    }
}

impl TryFrom<&EncodedPayload> for PayloadMetadata {
    type Error = Error;

    fn try_from(value: &EncodedPayload) -> Result<Self> {
        Self::now(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::encode;

    fn acme() -> MerchantAttributes {
        MerchantAttributes::new("Acme Traders", "174379", "404", "KE").with_store_label("Nairobi")
    }

    #[test]
    fn static_metadata() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let payload = encode(&acme(), None, None).unwrap();
        let metadata = PayloadMetadata::from_payload(&payload, at).unwrap();
        assert_eq!(
            metadata,
            PayloadMetadata {
                kind: PayloadKind::Static,
                business_code: "174379".into(),
                merchant_name: "Acme Traders".into(),
                currency_code: "404".into(),
                amount: None,
                reference: None,
                generated_at: at,
            }
        );
    }

    #[test]
    fn dynamic_metadata() {
        let amount: Amount = "250.75".parse().unwrap();
        let payload = encode(&acme(), Some(amount), Some("ORDER42")).unwrap();
        let metadata = PayloadMetadata::try_from(&payload).unwrap();
        assert_eq!(metadata.kind, PayloadKind::Dynamic);
        assert_eq!(metadata.amount, Some(amount));
        assert_eq!(metadata.reference.as_deref(), Some("ORDER42"));
    }

    #[test]
    fn unknown_point_of_initiation() {
        let body = "0002010102135802KE6304";
        let payload = format!("{body}{}", crate::checksum(body.as_bytes()));
        let parsed = crate::decode(&payload).unwrap();
        assert!(matches!(
            PayloadMetadata::from_parsed(&parsed, Utc::now()),
            Err(Error::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }
}
