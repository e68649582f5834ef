use crate::command::{Request, Response};
use crate::error::StoreError;
use crate::record::NewRecord;
use crate::{RecordEngine, Result};
use serde_json::Deserializer;
use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info};

/// A TCP socket server implementation over a record storage engine.
/// It listens for incoming [`Request`]s on a [`SocketAddr`](https://doc.rust-lang.org/std/net/enum.SocketAddr.html),
/// deserializes them, and processes each connection on a thread from a [`rayon`] pool.
///
/// Each connection receives a handle to a [`RecordEngine`] and uses that engine to process
/// its requests.
///
/// # Example
/// Create and run a new server listening on "127.0.0.1:4000", with 4 worker threads, storing
/// records in `products.json`
/// ```rust,no_run
/// use itemstore::{JsonStore, StoreServer};
/// # fn main() -> itemstore::Result<()> {
/// let engine = JsonStore::open("products.json")?;
/// let server = StoreServer::new(engine, 4)?;
/// server.run("127.0.0.1:4000")?;
/// # Ok(())
/// # }
/// ```
///
/// [`rayon`]: https://docs.rs/rayon/latest/rayon/index.html
pub struct StoreServer<E: RecordEngine> {
    /// the storage engine to use
    engine: E,
    /// a pool of threads that serve connections using a handle to the engine
    pool: rayon::ThreadPool,
}

impl<E: RecordEngine> StoreServer<E> {
    /// Create a new `StoreServer` over `engine`, serving connections on `threads` threads.
    ///
    /// # Errors
    /// returns [`StoreError::Server`] if the thread pool could not be built
    pub fn new(engine: E, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("itemstore-conn-{}", i))
            .build()
            .map_err(|e| StoreError::Server(format!("could not build thread pool: {:?}", &e)))?;
        debug!("created thread pool with {} threads", threads);

        Ok(StoreServer { engine, pool })
    }

    /// binds to `addr` and serves connections until the listener fails
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        self.serve(TcpListener::bind(addr)?)
    }

    /// serves connections accepted by an already bound `listener`.
    /// Each connection gets serviced on a thread from the pool
    pub fn serve(self, listener: TcpListener) -> Result<()> {
        info!("Listening on {}", listener.local_addr()?);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let engine = self.engine.clone();
                    self.pool.spawn(move || {
                        if let Err(e) = serve(engine, stream) {
                            error!("Error on serving client: {}", e);
                        }
                    });
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }
        Ok(())
    }
}

/// runs a single `request` against the engine and builds its [`Response`]
fn handle<E: RecordEngine>(engine: &E, request: Request) -> Response {
    let result = match request {
        Request::List => Ok(engine.read()),
        Request::Store { name, quantity, price } => engine.append(NewRecord { name, quantity, price }),
        Request::Update { index, field, value } => engine.patch_field(index, field, value),
    };

    match result {
        Ok(records) => Response::ok(records),
        Err(e) => Response::err(e.to_string()),
    }
}

/// Listens for and processes [`Request`]s coming over the given `tcp` stream.
/// This function will: deserialize each request, execute it on the engine,
/// and return a [`Response`] to the client on the `tcp` stream
fn serve<E: RecordEngine>(engine: E, tcp: TcpStream) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    let stream_reader = BufReader::new(&tcp);
    let mut stream_writer = BufWriter::new(&tcp);
    let req_reader = Deserializer::from_reader(stream_reader).into_iter::<Request>();

    for req in req_reader {
        let req = req?;
        debug!("Receive request from {}: {:?}", peer_addr, req);

        let resp = handle(&engine, req);
        serde_json::to_writer(&mut stream_writer, &resp)?;
        stream_writer.flush()?;
        debug!("Response sent to {}: success={}", peer_addr, resp.success);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonStore;
    use tempfile::TempDir;

    #[test]
    fn handle_reports_invalid_index_as_failure() {
        let dir = TempDir::new().unwrap();
        let engine = JsonStore::open(dir.path().join("products.json")).unwrap();

        let resp = handle(
            &engine,
            Request::Update { index: 0, field: "name".into(), value: "x".into() },
        );
        assert!(!resp.success);
        assert!(resp.data.is_none());
        assert_eq!(resp.message.as_deref(), Some("Invalid product index: 0"));
    }

    #[test]
    fn handle_store_then_list() {
        let dir = TempDir::new().unwrap();
        let engine = JsonStore::open(dir.path().join("products.json")).unwrap();

        let stored = handle(
            &engine,
            Request::Store { name: "A".into(), quantity: 2, price: 3.5 },
        );
        assert!(stored.success);

        let listed = handle(&engine, Request::List);
        assert_eq!(listed.data, stored.data);
        assert_eq!(listed.data.unwrap()[0].total_value, 7.0);
    }
}
