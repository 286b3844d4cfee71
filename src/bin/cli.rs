//! resplite CLI Client
//!
//! Sends commands to a RESP server and prints the replies.

use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::Parser;
use resplite::{ClientError, Connection, ConnectionConfig, Reply};
use tracing_subscriber::{fmt, EnvFilter};

/// resplite CLI
#[derive(Parser, Debug)]
#[command(name = "resplite-cli")]
#[command(about = "Send commands to a RESP key-value server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Logical database to select after connecting
    #[arg(short = 'n', long)]
    db: Option<i64>,

    /// Read/write timeout in milliseconds (0 = wait forever)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,

    /// Command and arguments; read commands from stdin when omitted
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,resplite=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = ConnectionConfig::builder()
        .host(&args.host)
        .port(args.port)
        .connect_timeout_ms(args.timeout_ms)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms);
    if let Some(index) = args.db {
        builder = builder.database(index);
    }
    let config = builder.build();

    let mut conn = match Connection::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = if args.command.is_empty() {
        run_interactive(&mut conn)
    } else {
        run_once(&mut conn, &args.command)
    };

    conn.close();

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute one command; `Ok(false)` if the server replied with an error
fn run_once(conn: &mut Connection, words: &[String]) -> Result<bool, ClientError> {
    let reply = send(conn, words)?;
    Ok(!reply.is_error())
}

/// Execute one command per stdin line until EOF
fn run_interactive(conn: &mut Connection) -> Result<bool, ClientError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            continue;
        }
        send(conn, &words)?;
    }
    Ok(true)
}

fn send(conn: &mut Connection, words: &[String]) -> Result<Reply, ClientError> {
    let (name, args) = words
        .split_first()
        .ok_or_else(|| ClientError::Config("empty command".to_string()))?;
    let reply = conn.execute(name, args)?;
    println!("{reply}");
    Ok(reply)
}
