use serde::{Deserialize, Serialize};

use super::de::number_or_string;
use super::StatusKind;

/// An M-Pesa payment transaction recorded by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub amount: f64,
    #[serde(default)]
    pub mpesa_receipt_number: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result_desc: String,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub merchant_request_id: Option<String>,
    #[serde(default)]
    pub checkout_request_id: Option<String>,
}

impl Transaction {
    pub fn status_kind(&self) -> StatusKind {
        StatusKind::classify(Some(&self.status))
    }

    pub fn is_successful(&self) -> bool {
        self.status_kind() == StatusKind::Success
    }

    pub fn receipt_display(&self) -> &str {
        self.mpesa_receipt_number.as_deref().unwrap_or("N/A")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction() {
        let t: Transaction = serde_json::from_str(
            r#"{"phoneNumber": "254700000000", "amount": 150, "mpesaReceiptNumber": null,
                "status": "Success", "resultDesc": "The service request is processed successfully.",
                "transactionDate": "20240115103045", "merchantRequestId": "m-1",
                "checkoutRequestId": null}"#,
        )
        .unwrap();
        assert!(t.is_successful());
        assert_eq!(t.receipt_display(), "N/A");
        assert_eq!(t.amount, 150.0);
    }
}
