use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::Parser;

use notesmith::mail::email_html::markdown_to_email_html;

/// Reads markdown on stdin and prints HTML ready to be mailed
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {}

fn main() -> Result<()> {
    let _args = Args::parse();

    let mut md = String::new();
    io::stdin().read_to_string(&mut md).context("Error reading stdin")?;
    println!("{}", markdown_to_email_html(&md)?);

    Ok(())
}
