//! Tests for main.rs startup validation (SECRET_KEY, secret file) and for serving once started

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::process::{Child, Command, Output, Stdio};

use bookshelf::jwt::JwtConfig;
use bookshelf::{ServerConfig, db::Database, start_server};

const ENV_SECRET: &str = "env-secret-that-is-long-enough-32chars";
const FILE_SECRET: &str = "this-is-a-long-secret-from-file-for-testing";

fn command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_bookshelf"));
    command
        .env_remove("SECRET_KEY")
        .args(["--database", ":memory:", "--listen-addr", "127.0.0.1:0"])
        .stderr(Stdio::piped())
        .stdout(Stdio::piped());
    command
}

fn run_binary(configure: impl FnOnce(&mut Command)) -> Output {
    let mut command = command();
    configure(&mut command);
    command.output().expect("Failed to run binary")
}

fn combined_output(output: &Output) -> String {
    // tracing logs to stdout by default
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// A running server binary, killed on drop.
struct RunningServer {
    child: Child,
    addr: SocketAddr,
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

/// Start the binary with JSON logs and wait for its "Listening" line.
fn spawn_server(configure: impl FnOnce(&mut Command)) -> RunningServer {
    let mut command = command();
    command.args(["--log-format", "json"]);
    configure(&mut command);
    let mut child = command.spawn().expect("Failed to run binary");

    let stdout = child.stdout.take().unwrap();
    let mut seen = String::new();
    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next() {
        let line = line.unwrap();
        seen.push_str(&line);
        seen.push('\n');

        let Ok(event) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        if event["fields"]["message"] == "Listening" {
            let addr = event["fields"]["address"].as_str().unwrap().parse().unwrap();
            // Keep draining so later log lines never hit a closed pipe.
            std::thread::spawn(move || lines.for_each(drop));
            return RunningServer { child, addr };
        }
    }

    let status = child.wait().unwrap();
    panic!(
        "Server exited with status {:?} before listening, output: {}",
        status, seen
    );
}

/// Minimal HTTP/1.1 exchange. Returns (status, body).
fn http(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    let body = body.unwrap_or("");
    write!(
        stream,
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        body.len(),
        body
    )
    .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("Malformed response: {}", response));
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

/// Register and log in over HTTP; returns the session token.
fn register_and_login(addr: SocketAddr) -> String {
    let (status, body) = http(
        addr,
        "POST",
        "/users",
        Some(r#"{"name": "Vitya", "email": "vitya@mail.ru", "password": "pass1"}"#),
    );
    assert_eq!(status, 201, "register failed: {}", body);

    let (status, body) = http(
        addr,
        "POST",
        "/auth/login",
        Some(r#"{"name": "Vitya", "password": "pass1"}"#),
    );
    assert_eq!(status, 200, "login failed: {}", body);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    json["message"].as_str().unwrap().to_string()
}

#[test]
fn test_missing_secret_exits_with_error() {
    let output = run_binary(|_| {});

    assert!(
        !output.status.success(),
        "Should exit with error when SECRET_KEY is missing"
    );

    let combined = combined_output(&output);
    assert!(
        combined.contains("SECRET_KEY") && combined.contains("required"),
        "Should mention SECRET_KEY is required, got: {}",
        combined
    );
}

#[test]
fn test_short_secret_exits_with_error() {
    let output = run_binary(|command| {
        command.env("SECRET_KEY", "too-short");
    });

    assert!(
        !output.status.success(),
        "Should exit with error when SECRET_KEY is too short"
    );

    let combined = combined_output(&output);
    assert!(
        combined.contains("shorter than"),
        "Should mention the secret is too short, got: {}",
        combined
    );
}

#[test]
fn test_unreadable_secret_file_exits_with_error() {
    let output = run_binary(|command| {
        command.args(["--secret-file", "/nonexistent/bookshelf-secret"]);
    });

    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("Failed to read secret file"),
        "got: {}",
        combined
    );
}

#[test]
fn test_secret_env_serves_requests() {
    let server = spawn_server(|command| {
        command.env("SECRET_KEY", ENV_SECRET);
    });

    let (status, _) = http(server.addr, "GET", "/books", None);
    assert_eq!(status, 401);

    let token = register_and_login(server.addr);
    assert!(JwtConfig::new(ENV_SECRET.as_bytes()).verify(&token).is_ok());
}

#[test]
fn test_secret_file() {
    let secret_file = std::env::temp_dir().join(format!("bookshelf_secret_{}", std::process::id()));
    fs::write(&secret_file, format!("{}\n", FILE_SECRET)).unwrap();

    let server = spawn_server(|command| {
        command.args(["--secret-file", secret_file.to_str().unwrap()]);
    });
    let _ = fs::remove_file(&secret_file);

    let token = register_and_login(server.addr);
    assert!(JwtConfig::new(FILE_SECRET.as_bytes()).verify(&token).is_ok());
}

#[test]
fn test_secret_env_takes_precedence_over_file() {
    // Too short to start with, so a running server proves the file was ignored.
    let secret_file =
        std::env::temp_dir().join(format!("bookshelf_secret_precedence_{}", std::process::id()));
    fs::write(&secret_file, "file-secret").unwrap();

    let server = spawn_server(|command| {
        command
            .env("SECRET_KEY", ENV_SECRET)
            .args(["--secret-file", secret_file.to_str().unwrap()]);
    });
    let _ = fs::remove_file(&secret_file);

    let token = register_and_login(server.addr);
    assert!(JwtConfig::new(ENV_SECRET.as_bytes()).verify(&token).is_ok());
}

#[tokio::test]
async fn test_start_server_on_random_port() {
    let db = Database::open(":memory:").await.unwrap();
    let config = ServerConfig {
        db,
        jwt_secret: ENV_SECRET.as_bytes().to_vec(),
        revocation: true,
    };

    let (handle, addr) = start_server(config, 0).await.unwrap();
    assert_ne!(addr.port(), 0);

    let (status, body) = tokio::task::spawn_blocking(move || http(addr, "GET", "/auth/profile", None))
        .await
        .unwrap();
    assert_eq!(status, 401);
    assert!(body.contains("Authorization token is missing"));

    handle.abort();
}
