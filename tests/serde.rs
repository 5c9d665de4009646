#![cfg(feature = "serde")]
use cbk_qr::*;
use chrono::{TimeZone, Utc};

#[test]
fn metadata_to_json() {
    let merchant = MerchantAttributes::new("Acme Traders", "174379", "404", "KE");
    let amount: Amount = "150".parse().expect("Can't parse amount");
    let payload = encode(&merchant, Some(amount), Some("INV001")).expect("Can't encode payload");
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let metadata = PayloadMetadata::from_payload(&payload, at).expect("Can't build metadata");

    let json = serde_json::to_value(&metadata).expect("Can't serialize metadata to json");
    assert_eq!(json["kind"], "dynamic");
    assert_eq!(json["amount"], "150");
    assert_eq!(json["reference"], "INV001");

    let back: PayloadMetadata = serde_json::from_value(json).expect("Can't deserialize metadata");
    assert_eq!(back, metadata);
}

#[test]
fn options_from_json() {
    let options: EncoderOptions =
        serde_json::from_str(r#"{ "name_overflow": "truncate" }"#).expect("Can't parse options");
    assert_eq!(options.name_overflow, NameOverflow::Truncate);
    assert_eq!(options.max_name_len, 25);
    assert_eq!(options.postal_code, "00");
}

#[test]
fn parsed_payload_to_json() {
    let merchant = MerchantAttributes::new("Acme Traders", "174379", "404", "KE");
    let payload = encode(&merchant, None, None).expect("Can't encode payload");
    let parsed = payload.parse().expect("Can't parse payload");

    let json = serde_json::to_value(&parsed).expect("Can't serialize payload to json");
    assert_eq!(json["fields"][0]["tag"], 0);
    assert_eq!(json["checksum_valid"], true);
    assert_eq!(serde_json::to_value(&payload).unwrap(), payload.as_str());
}
