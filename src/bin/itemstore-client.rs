//! The itemstore-client executable supports the following command line arguments:
//!
//! `itemstore-client list [--addr IP-PORT]`
//!
//!     Print every record and the grand total.
//!
//! `itemstore-client add <NAME> <QUANTITY> <PRICE> [--addr IP-PORT]`
//!
//!     Append a new record. QUANTITY must be a whole number and PRICE a decimal number.
//!
//! `itemstore-client set <INDEX> <FIELD> <VALUE> [--addr IP-PORT]`
//!
//!     Set one field of the record at INDEX. Setting quantity or price recomputes total_value.
//!
//! --addr accepts an IP address, either v4 or v6, and a port number, with the format IP:PORT.
//! If --addr is not specified then connect on 127.0.0.1:4000.
//! After every command the full list of records is printed. An error is printed and a
//! non-zero exit code returned on server error, or if an argument does not parse.
//!
//! `itemstore-client -V`
//!
//!     Print the version.


use std::net::SocketAddr;
use std::process::exit;
use clap::{crate_version, App, AppSettings, Arg, SubCommand, ArgMatches};
use itemstore::summary::render_table;
use itemstore::{NewRecord, Request, Result, StoreClient, StoreError};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:4000";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's ip:port
    addr: SocketAddr,
    req: Request,
}

impl Opt {
    /// validates the `addr` parameter is a valid IP address and PORT
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`StoreError::Parsing`] if one of the parameters is invalid
    ///
    fn build(addr: &str, req: Request) -> Result<Opt> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| StoreError::Parsing(format!("could not parse {} into an IP address and port", &addr)))?;

        Ok(Opt { addr, req })
    }
}

fn main() {
    // configure a subscriber that will log warnings to STDERR
    subscriber_config();

    let matches = App::new("itemstore-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("talks to an itemstore-server")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommands(vec![
            SubCommand::with_name("list")
                .about("Print every record and the grand total")
                .arg(addr_arg()),
            SubCommand::with_name("add")
                .about("Append a new record")
                .arg(Arg::with_name("NAME").required(true).index(1))
                .arg(Arg::with_name("QUANTITY").required(true).index(2))
                .arg(Arg::with_name("PRICE").required(true).index(3))
                .arg(addr_arg()),
            SubCommand::with_name("set")
                .about("Set one field of the record at INDEX")
                .arg(Arg::with_name("INDEX").required(true).index(1))
                .arg(Arg::with_name("FIELD").required(true).index(2))
                .arg(Arg::with_name("VALUE").required(true).index(3))
                .arg(addr_arg()),
        ])
        .get_matches();

    // parse commands into an Opt struct, then send the request
    if let Err(e) = parse_options(&matches).and_then(run) {
        eprintln!("{}", e);
        exit(1);
    }
}

/// the `--addr` option, accepted by every subcommand
fn addr_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("addr")
        .long("addr")
        .value_name("IP_ADDR:PORT")
        .help("sets the IP_ADDR:PORT of the server to connect to")
        .default_value(DEFAULT_ADDRESS)
}

/// sends the specified request with a [`StoreClient`] and prints the resulting records
/// `opt` contains the server address and the request to send
fn run(opt: Opt) -> Result<()> {
    debug!(?opt);
    let mut client = StoreClient::connect(opt.addr)?;
    let records = match opt.req {
        Request::List => client.list()?,
        Request::Store { name, quantity, price } => {
            client.store(NewRecord { name, quantity, price })?
        }
        Request::Update { index, field, value } => client.update(index, field, value)?,
    };
    print!("{}", render_table(&records));
    Ok(())
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let (req, args) = match matches.subcommand() {
        ("list", Some(args)) => (Request::List, args),
        ("add", Some(args)) => {
            let item = NewRecord::parse(arg(args, "NAME"), &arg(args, "QUANTITY"), &arg(args, "PRICE"))?;
            (Request::Store { name: item.name, quantity: item.quantity, price: item.price }, args)
        }
        ("set", Some(args)) => {
            let index = arg(args, "INDEX");
            let index = index
                .parse::<i64>()
                .map_err(|_| StoreError::Parsing(format!("INDEX must be an integer, got {}", &index)))?;
            (Request::Update { index, field: arg(args, "FIELD"), value: arg(args, "VALUE") }, args)
        }
        (name, _) => return Err(StoreError::Parsing(format!("unknown command: {}", name))),
    };
    Opt::build(args.value_of("addr").unwrap_or(DEFAULT_ADDRESS), req)
}

/// the value of the positional arg `name`.
/// positional args are required, so clap has already rejected missing ones
fn arg(args: &ArgMatches, name: &str) -> String {
    args.value_of(name).unwrap_or_default().to_string()
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // stdout is reserved for the records, only warnings and errors are logged
        .with_max_level(Level::WARN)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
