use serde::{Deserialize, Serialize};

use crate::record::Record;

/// These are the request "commands" that can be made to the item store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// list every record
    List,
    /// append a new record
    Store {
        /// product name
        name: String,
        /// quantity in stock
        quantity: i64,
        /// price per item
        price: f64,
    },
    /// set one field of an existing record
    Update {
        /// position of the record in the document
        index: i64,
        /// name of the field to set
        field: String,
        /// new value of the field, as text
        value: String,
    },
}

/// The response returned for any [`Request`].
///
/// On success `data` holds the full (updated) sequence of records, on failure `message`
/// describes what went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// whether the request was serviced
    pub success: bool,
    /// every record after the request ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
    /// the reason a request failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    /// a successful response carrying `records`
    pub fn ok(records: Vec<Record>) -> Self {
        Response {
            success: true,
            data: Some(records),
            message: None,
        }
    }

    /// a failed response carrying `message`
    pub fn err(message: impl Into<String>) -> Self {
        Response {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}
