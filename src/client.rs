use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::Deserializer;
use crate::command::{Request, Response};
use crate::record::{NewRecord, Record};
use crate::{StoreError, Result};

/// `StoreClient` contains the functionality for communication with a [`StoreServer`]
///
/// [`StoreServer`]: crate::StoreServer
pub struct StoreClient {
    reader: Deserializer<IoRead<BufReader<TcpStream>>>,
    writer: BufWriter<TcpStream>,
}

impl StoreClient {

    /// creates a client and establishes a socket connection to the server at the given `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;

        Ok(StoreClient {
            reader: Deserializer::from_reader(BufReader::new(tcp_reader)),
            writer: BufWriter::new(tcp_writer),
        })
    }

    /// gets every record from the server, in document order
    pub fn list(&mut self) -> Result<Vec<Record>> {
        self.send(Request::List)
    }

    /// appends a new record
    /// # Returns
    /// every record, including the new one at the end
    pub fn store(&mut self, item: NewRecord) -> Result<Vec<Record>> {
        let NewRecord { name, quantity, price } = item;
        self.send(Request::Store { name, quantity, price })
    }

    /// sets `field` of the record at `index` to `value`
    /// # Returns
    /// every record, after the update
    /// # Errors
    /// `Err<StoreError::Server>` if the index was invalid or the value was rejected
    pub fn update(&mut self, index: i64, field: String, value: String) -> Result<Vec<Record>> {
        self.send(Request::Update { index, field, value })
    }

    fn send(&mut self, req: Request) -> Result<Vec<Record>> {
        serde_json::to_writer(&mut self.writer, &req)?;
        self.writer.flush()?;

        let resp = Response::deserialize(&mut self.reader)?;
        if resp.success {
            Ok(resp.data.unwrap_or_default())
        } else {
            // re-throwing the server's error here
            Err(StoreError::Server(
                resp.message.unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }
}
