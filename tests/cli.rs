use assert_cmd::prelude::*;
use predicates::str::contains;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// `itemstore-client` with no args should exit with a non-zero code.
#[test]
fn client_cli_no_args() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-client")
        .unwrap()
        .current_dir(&temp_dir)
        .assert()
        .failure();
}

#[test]
fn client_cli_invalid_subcommand() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["unknown"])
        .current_dir(&temp_dir)
        .assert()
        .failure();
}

// `itemstore-client -V` should print the version
#[test]
fn client_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["-V"])
        .current_dir(&temp_dir)
        .assert()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn client_cli_invalid_add() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["add", "Widget", "2"])
        .current_dir(&temp_dir)
        .assert()
        .failure();

    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["add", "Widget", "two", "3.5"])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(contains("quantity must be numeric"));

    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["add", "Widget", "2", "3.5", "--addr", "invalid-addr"])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(contains("could not parse invalid-addr"));
}

#[test]
fn client_cli_invalid_set() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["set", "first", "price", "10"])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(contains("INDEX must be an integer"));
}

#[test]
fn server_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-server")
        .unwrap()
        .args(&["-V"])
        .current_dir(&temp_dir)
        .assert()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn server_cli_invalid_options() {
    let temp_dir = TempDir::new().unwrap();
    Command::cargo_bin("itemstore-server")
        .unwrap()
        .args(&["--threads", "0"])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(contains("threads must be a positive integer"));

    Command::cargo_bin("itemstore-server")
        .unwrap()
        .args(&["--log-level", "loud"])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(contains("unknown log level"));
}

// an address on a port that was free a moment ago
fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

// waits until something accepts connections on `addr`
fn wait_for_server(addr: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("server did not start listening on {}", addr);
}

#[test]
fn cli_add_set_list() {
    let temp_dir = TempDir::new().unwrap();
    let server_addr = free_addr();
    let addr = &server_addr.to_string();
    let mut server = Command::cargo_bin("itemstore-server")
        .unwrap()
        .args(&["--addr", addr])
        .current_dir(&temp_dir)
        .spawn()
        .unwrap();
    wait_for_server(server_addr);

    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["add", "Widget", "2", "3.5", "--addr", addr])
        .current_dir(&temp_dir)
        .assert()
        .success()
        .stdout(contains("Widget"))
        .stdout(contains("$7.00"));

    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["set", "0", "price", "10", "--addr", addr])
        .current_dir(&temp_dir)
        .assert()
        .success()
        .stdout(contains("$20.00"));

    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["set", "3", "price", "10", "--addr", addr])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(contains("Invalid product index: 3"));

    Command::cargo_bin("itemstore-client")
        .unwrap()
        .args(&["list", "--addr", addr])
        .current_dir(&temp_dir)
        .assert()
        .success()
        .stdout(contains("Widget"))
        .stdout(contains("$20.00"));

    server.kill().expect("server exited before killed");

    // the server kept its document at the default path under its working directory
    assert!(temp_dir.path().join("database/json/products.json").exists());
}
