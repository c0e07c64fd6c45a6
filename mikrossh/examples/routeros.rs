//! RouterOS example: run a few read-only commands and print the cleaned output.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example routeros -- --host 192.168.88.1 --user admin --password secret
//! cargo run --example routeros -- --host 192.168.88.1 --user admin --key ~/.ssh/id_ed25519
//! ```
//!
//! Set `RUST_LOG=mikrossh=trace` to see raw channel traffic, including the
//! repainted echoes that never reach the printed output.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use mikrossh::{Driver, DriverBuilder, HostKeyVerification, TimingOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = DriverBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .platform(&args.platform)
        .timeout(Duration::from_secs(args.timeout));

    if args.accept_any_key {
        builder = builder.host_key_verification(HostKeyVerification::Disabled);
    }

    builder = match (&args.password, &args.key) {
        (Some(password), _) => builder.password(password),
        (None, Some(key_path)) => builder.private_key(key_path),
        (None, None) => builder,
    };

    let mut session = builder.build()?;

    println!("Connecting to {}:{}...", args.host, args.port);
    session.open().await?;
    println!("Connected, prompt is {:?}", session.base_prompt());

    for command in [
        "/system identity print",
        "/system resource print",
        "/interface print terse",
    ] {
        println!("\n> {}", command);
        println!("{}", "-".repeat(50));

        let response = session.send_command(command).await?;
        if response.is_success() {
            println!("{}", response.result);
        } else {
            eprintln!("Command failed: {:?}", response.failure_message);
        }
        println!("{}", "-".repeat(50));
        println!("Completed in {:?}", response.elapsed);
    }

    // ping keeps printing until it is done, so read until the device goes quiet
    println!("\n> ping count=3 127.0.0.1");
    let response = session
        .send_command_timing("ping count=3 127.0.0.1", TimingOptions::default())
        .await?;
    println!("{}", response.result);

    session.close().await?;
    println!("\nDone!");

    Ok(())
}

struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    platform: String,
    timeout: u64,
    accept_any_key: bool,
}

impl Args {
    fn parse() -> Self {
        let mut parsed = Self {
            host: "192.168.88.1".to_string(),
            port: 22,
            user: "admin".to_string(),
            password: None,
            key: None,
            platform: "mikrotik_routeros".to_string(),
            timeout: 30,
            accept_any_key: false,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => parsed.host = args.next().unwrap_or(parsed.host),
                "--port" | "-p" => {
                    parsed.port = args.next().and_then(|v| v.parse().ok()).unwrap_or(22)
                }
                "--user" | "-u" => parsed.user = args.next().unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = args.next(),
                "--key" | "-k" => parsed.key = args.next().map(PathBuf::from),
                "--platform" => parsed.platform = args.next().unwrap_or(parsed.platform),
                "--timeout" | "-t" => {
                    parsed.timeout = args.next().and_then(|v| v.parse().ok()).unwrap_or(30)
                }
                "--accept-any-key" => parsed.accept_any_key = true,
                "--help" => {
                    println!(
                        "usage: routeros [--host HOST] [--port PORT] [--user USER] \
                         [--password PASS | --key PATH] [--platform NAME] [--timeout SECS] \
                         [--accept-any-key]"
                    );
                    std::process::exit(0);
                }
                other => eprintln!("Unknown argument: {}", other),
            }
        }

        parsed
    }
}
