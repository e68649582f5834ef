#![deny(missing_docs)]
//! A persistent line item store that keeps every record in a single JSON document.
//!
//! This crate provides the [`JsonStore`] implementation itself, as well as an
//! [`itemstore-client`] and [`itemstore-server`] executable that can be used to interact with it.
//! Requests and responses are sent between the client and server as JSON over TCP.
//!
//! ## Records
//! A [`Record`] is one line item: a `name`, a `quantity`, a `price`, the time it was
//! `submitted_at`, and a derived `total_value` that always equals `quantity * price` right after
//! either of those changes. Callers may also patch arbitrary extra fields onto a record; they are
//! kept verbatim.
//!
//! Records have no stable id. A record is addressed by its position in the document, so the
//! document is only ever appended to or mutated in place.
//!
//! ## Supported Storage Operations
//! - `read` every record. A missing or malformed document reads as an empty sequence.
//! - `append` a new record built from a name, quantity and price.
//! - `patch_field` of the record at an index. Setting `quantity` or `price` recomputes
//! `total_value`; numeric fields given non-numeric text are rejected.
//!
//! See the [`RecordEngine`] trait and the [`Request`] and [`Response`] types for more information
//! on the structure of these operations.
//!
//! ## The Document
//! All records live in one pretty printed JSON array. Nothing is cached in memory, every
//! operation re-reads the document, and every mutation rewrites it in full via a temporary file
//! and an atomic rename. Mutations are serialized on a single writer thread, so concurrent
//! callers never lose each other's updates.
//!
//! [`itemstore-server`]: ./bin/itemstore-server.rs
//! [`itemstore-client`]: ./bin/itemstore-client.rs

pub use error::{Result, StoreError};
pub use engine::{RecordEngine, JsonStore};
pub use record::{coerce, NewRecord, Record, TIMESTAMP_FORMAT};
pub use server::StoreServer;
pub use client::StoreClient;
pub use command::{Response, Request};

mod client;
mod command;
mod engine;
mod error;
mod record;
mod server;
pub mod summary;
