//! walkv CLI Client
//!
//! Command-line interface for interacting with a walkv server.
//! Runs one command when given a subcommand, otherwise an interactive prompt.

use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;
use std::process;

use clap::{Parser, Subcommand};

/// Size of the response buffer; one read per response
const RESPONSE_BUFFER_SIZE: usize = 64 * 1024;

/// walkv CLI
#[derive(Parser, Debug)]
#[command(name = "walkv-cli")]
#[command(about = "CLI for the walkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:3223")]
    server: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print the protocol grammar
    Help,
}

impl Commands {
    fn to_request(&self) -> String {
        match self {
            Commands::Get { key } => format!("GET {}\n", key),
            Commands::Set { key, value } => format!("SET {} {}\n", key, value),
            Commands::Del { key } => format!("DEL {}\n", key),
            Commands::Help => "help\n".to_string(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut stream = match TcpStream::connect(&args.server) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            process::exit(1);
        }
    };

    let result = match &args.command {
        Some(command) => round_trip(&mut stream, &command.to_request()).map(|reply| {
            print!("{}", reply);
        }),
        None => interactive(&mut stream),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Read lines from stdin and forward them until EOF, `exit` or disconnect
fn interactive(stream: &mut TcpStream) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            let reply = round_trip(stream, &format!("{}\n", line))?;
            if reply.is_empty() {
                println!("(connection closed)");
                return Ok(());
            }
            print!("{}", reply);
            if line.trim() == "exit" {
                return Ok(());
            }
        }
        print!("> ");
        stdout.flush()?;
    }

    Ok(())
}

/// Send one request and read one response
fn round_trip(stream: &mut TcpStream, request: &str) -> io::Result<String> {
    stream.write_all(request.as_bytes())?;

    let mut buffer = vec![0u8; RESPONSE_BUFFER_SIZE];
    let count = stream.read(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer[..count]).into_owned())
}
