//! this binary starts the item store server
//! to see the list of options, type: `itemstore-server --help`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::exit;
use clap::{crate_version, App, Arg};
use itemstore::{JsonStore, Result, StoreError, StoreServer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:4000";
// default location of the document, relative to the working directory
const DEFAULT_DOCUMENT: &str = "database/json/products.json";
const DEFAULT_THREADS: &str = "4";
const DEFAULT_LOG_LEVEL: &str = "info";


/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    document: PathBuf,
    threads: usize,
    log_level: Level,
}

impl Opt {
    /// validates the raw command line values
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`StoreError::Parsing`] if one of the parameters is invalid
    ///
    fn build(addr: &str, document: &str, threads: &str, log_level: &str) -> Result<Opt> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| StoreError::Parsing(format!("could not parse {} into an IP address and port", &addr)))?;

        let threads = match threads.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => return Err(StoreError::Parsing(format!("threads must be a positive integer, got {}", &threads))),
        };

        let log_level = log_level
            .parse::<Level>()
            .map_err(|_| StoreError::Parsing(format!("unknown log level: {}", &log_level)))?;

        Ok(Opt { addr, document: PathBuf::from(document), threads, log_level })
    }
}


fn main() {
    // parse command line args
    let matches = App::new("itemstore-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("serves a line item store kept in a single JSON document")
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT that the server listens on")
            .default_value(DEFAULT_ADDRESS))
        .arg(Arg::with_name("data")
            .long("data")
            .value_name("PATH")
            .help("sets the path of the JSON document holding the records")
            .default_value(DEFAULT_DOCUMENT))
        .arg(Arg::with_name("threads")
            .long("threads")
            .value_name("N")
            .help("sets the number of threads serving connections")
            .default_value(DEFAULT_THREADS))
        .arg(Arg::with_name("log-level")
            .long("log-level")
            .value_name("LEVEL")
            .help("one of: trace, debug, info, warn, error")
            .default_value(DEFAULT_LOG_LEVEL))
        .get_matches();

    // every arg has a default value
    let opt = match Opt::build(
        matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS),
        matches.value_of("data").unwrap_or(DEFAULT_DOCUMENT),
        matches.value_of("threads").unwrap_or(DEFAULT_THREADS),
        matches.value_of("log-level").unwrap_or(DEFAULT_LOG_LEVEL),
    ) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // set up a tracing subscriber to log to STDERR
    subscriber_config(opt.log_level);

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}


fn run(opt: Opt) -> Result<()> {
    info!("itemstore-server {}", env!("CARGO_PKG_VERSION"));
    info!("Document: {}", opt.document.display());

    let engine = JsonStore::open(&opt.document)?;
    let server = StoreServer::new(engine, opt.threads)?;
    server.run(opt.addr)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config(level: Level) {
    let subscriber = FmtSubscriber::builder()
        // spans/events at `level` or more severe will be written
        .with_max_level(level)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
