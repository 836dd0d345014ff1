use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// One row of the subscriber export. Columns other than `Subscriber` are ignored.
#[derive(Debug, serde::Deserialize, Clone, PartialEq)]
pub struct Subscriber {
    #[serde(rename = "Subscriber")]
    pub email: String,
}

pub fn read_subscribers<R: Read>(reader: R) -> Result<Vec<Subscriber>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut subscribers = vec![];
    for (i, row) in rdr.deserialize().enumerate() {
        // Line 1 is the header
        let subscriber: Subscriber = row.with_context(|| format!("Invalid subscriber on line {}", i + 2))?;
        subscribers.push(subscriber);
    }
    Ok(subscribers)
}

pub fn load_subscribers(path: &Path) -> Result<Vec<Subscriber>> {
    let file = File::open(path)
        .with_context(|| format!("Error opening subscribers file {}", path.display()))?;
    read_subscribers(file)
        .with_context(|| format!("Error reading subscribers file {}", path.display()))
}
