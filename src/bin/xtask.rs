use std::env::{args, var};
use std::process::Command;

use anyhow::{anyhow, ensure, Result};

fn main() -> Result<()> {
    match args().nth(1).as_deref() {
        None => default(),
        Some("relay") => relay(),
        Some(name) => Err(anyhow!("Unknown task {}", name)),
    }
}

fn default() -> Result<()> {
    let status = Command::new("cargo").arg("fmt").status()?;

    ensure!(status.success(), "Rustfmt failed with status {:?}", status);

    let status = Command::new("cargo")
        .args(["clippy", "--all-targets"])
        .status()?;

    ensure!(status.success(), "Clippy failed with status {:?}", status);

    let status = Command::new("cargo").arg("test").status()?;

    ensure!(status.success(), "Tests failed with status {:?}", status);

    Ok(())
}

fn relay() -> Result<()> {
    let mut cmd = Command::new("cargo");

    cmd.args(["run", "--bin", "relay"]).envs([
        ("BIND_ADDR", "127.0.0.1:8081"),
        ("REQUEST_LIMIT", "32"),
        ("RUST_LOG", "info,meeveem=debug,relay=debug,tower_http=debug"),
    ]);

    // Without a key, the relay still starts and answers submissions with a configuration error.
    if var("BREVO_API_KEY").is_err() {
        eprintln!("BREVO_API_KEY not set, submissions will be rejected");
    }

    let status = cmd.status()?;

    ensure!(status.success(), "Relay failed with status {:?}", status);

    Ok(())
}
