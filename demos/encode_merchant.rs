use cbk_qr::{decode, Amount, Encoder, MerchantAttributes, PayloadMetadata};

fn main() {
    let merchant = MerchantAttributes::new("Acme Traders", "174379", "404", "KE")
        .with_category_code("5411")
        .with_store_label("Nairobi");
    let encoder = Encoder::new();

    // Storefront code, the payer types the amount
    let payload = encoder.merchant_payload(&merchant).expect("Encode failed");
    println!("{payload}");

    // Checkout code for a single sale
    let amount: Amount = "150".parse().expect("Invalid amount");
    let payload = encoder
        .transaction_payload(&merchant, amount, Some("INV001"))
        .expect("Encode failed");
    println!("{payload}");

    let parsed = decode(payload.as_str()).expect("Decode failed");
    println!("{parsed:#?}");
    println!("{:#?}", PayloadMetadata::now(&payload).expect("Metadata failed"));
}
