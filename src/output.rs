use std::io::{self, Write};

use serde::Serialize;

use crate::fetch::{FetchResult, RunsResult};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_runs(result: &RunsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::fetch::ProgressSink for JsonOutput {
    fn event(&self, event: crate::fetch::ProgressEvent) {
        tracing::debug!("{}", event.message);
    }
}
