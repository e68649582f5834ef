use std::io;
use thiserror::Error;

/// type alias for all operations on a [`JsonStore`](crate::JsonStore) that could fail with a [`StoreError`]
pub type Result<T> = std::result::Result<T, StoreError>;

/// The Error variants used by the record store, its server and its client.
#[derive(Error, Debug)]
pub enum StoreError {
    /// variant for errors caused from file or socket IO
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// serde_json could not encode or decode a value
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// the temporary document could not be moved over the real one
    #[error("could not persist the document: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// a patch addressed a position that does not exist in the document
    #[error("Invalid product index: {0}")]
    InvalidIndex(i64),

    /// a quantity or price was given text that is not a number
    #[error("{field} must be numeric, got {value:?}")]
    NotNumeric {
        /// the field being set
        field: String,
        /// the rejected text
        value: String,
    },

    /// `quantity * price` is too large to be stored as a number
    #[error("total value of {quantity} x {price} is out of range")]
    Overflow {
        /// the quantity of the record
        quantity: i64,
        /// the price of the record
        price: f64,
    },

    /// the document exists but is not a JSON array of objects, so it is not rewritten
    #[error("refusing to rewrite malformed document: {0}")]
    MalformedDocument(String),

    /// the document writer thread is gone, or died while running the job
    #[error("the document writer is not running")]
    WriterGone,

    /// command line values or other text that could not be parsed
    #[error("{0}")]
    Parsing(String),

    /// an error message returned by the server
    #[error("{0}")]
    Server(String),
}
