//! Keyword chatbot: the first rule with a keyword contained in the message wins.

const RULES: &[(&[&str], &str)] = &[
    (
        &["refund", "return", "retur"],
        "Returns can be requested once you have accepted a delivered order. Open the order and choose \"Request return\" with a reason and photos.",
    ),
    (
        &["proof", "transfer", "payment", "bayar", "pay"],
        "After checkout, open a payment and upload your proof of transfer within 5 minutes. An admin reviews it and confirms your order.",
    ),
    (
        &["tracking", "resi", "shipping", "expedition", "courier", "kirim"],
        "The tracking number appears on your order as soon as it is handed to the expedition.",
    ),
    (
        &["cancel", "batal"],
        "Orders can be cancelled until they are handed to the expedition.",
    ),
    (
        &["hello", "halo", "good morning", "selamat"],
        "Hello! Ask about payment, shipping, cancellation or returns, or wait for an admin to join.",
    ),
];

pub fn reply_to(message: &str) -> Option<&'static str> {
    let text = message.to_lowercase();
    RULES.iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, reply)| *reply)
}
