//! Output is the thin JSON/YAML rendering layer spec §1's Non-goals leave to collaborators —
//! no color tables, no TUI, just one of two flat, scriptable encodings.

use serde::Serialize;

use crate::{Error, Result};

/// Format selects how [`render`] encodes a value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Json,
    Yaml,
}

impl std::str::FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(Error::Usage(format!("unknown --format {other:?}, expected json or yaml"))),
        }
    }
}

/// Render writes `value` to stdout in the requested [`Format`].
pub fn render<T: Serialize>(value: &T, format: Format) -> Result<()> {
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    match format {
        Format::Json => serde_json::to_writer_pretty(handle, value)?,
        Format::Yaml => serde_yaml::to_writer(handle, value)?,
    }
    println!();
    Ok(())
}
