//! Runs the command-line tools against a simulated router.

mod common;

use std::net::TcpListener;
use std::process::{Command, Output};

use common::{Behaviour, Simulator};

fn read_tag(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_read-tag"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn find_net_id(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_find-net-id"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_read_tag_prints_value_only() {
    let sim = Simulator::with_temperature(Behaviour::Normal);
    let router = sim.addr().to_string();

    let output = read_tag(&["--router", &router, "10.0.0.5.1.1", "Temperature"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "23.5\n");
}

#[test]
fn test_read_tag_with_type() {
    let sim = Simulator::start(Behaviour::Normal);
    sim.add_symbol(
        "MAIN.nCount",
        0x4020,
        0x20,
        beckhoff_ads::AdsType::DInt,
        &42i32.to_le_bytes(),
    );
    let router = sim.addr().to_string();

    let output = read_tag(&[
        "--router",
        &router,
        "--type",
        "DINT",
        "10.0.0.5.1.1:851",
        "MAIN.nCount",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "42\n");
}

#[test]
fn test_read_tag_unknown_symbol() {
    let sim = Simulator::with_temperature(Behaviour::Normal);
    let router = sim.addr().to_string();

    let output = read_tag(&["--router", &router, "10.0.0.5.1.1", "Nonexistent"]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("Error: "));
    assert!(stderr(&output).contains("Nonexistent"));
}

#[test]
fn test_read_tag_timeout() {
    let sim = Simulator::with_temperature(Behaviour::Silent);
    let router = sim.addr().to_string();

    let output = read_tag(&[
        "--router",
        &router,
        "--timeout",
        "200",
        "10.0.0.5.1.1",
        "Temperature",
    ]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(!stderr(&output).is_empty());
}

#[test]
fn test_read_tag_zero_timeout() {
    let sim = Simulator::with_temperature(Behaviour::Normal);
    let router = sim.addr().to_string();

    let output = read_tag(&[
        "--router",
        &router,
        "--timeout",
        "0",
        "10.0.0.5.1.1",
        "Temperature",
    ]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("Error: Invalid parameter 'timeout'"));
}

#[test]
fn test_read_tag_connection_refused() {
    let router = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let output = read_tag(&["--router", &router, "10.0.0.5.1.1", "Temperature"]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("Error: "));
}

#[test]
fn test_read_tag_bad_arguments() {
    let output = read_tag(&["10.0.0.5.1.1"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("Usage:"));

    let output = read_tag(&["not-a-net-id", "Temperature"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_find_net_id() {
    let sim = Simulator::start(Behaviour::Normal);
    let router = sim.addr().to_string();

    let output = find_net_id(&["--router", &router]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "NET_ID:10.0.0.5.1.1\n");
}

#[test]
fn test_find_net_id_no_router() {
    let router = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let output = find_net_id(&["--router", &router, "--timeout", "500"]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).starts_with("Error: "));
}
