use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::print_regions;

pub fn cmd_parse(file: Option<PathBuf>, json: bool) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("could not read stdin")?;
            buf
        }
    };

    let regions = markbox::parse(&raw);
    print_regions(&regions, json)
}
