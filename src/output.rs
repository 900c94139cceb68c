use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::app::{IntegrateResult, ProgressEvent, ProgressSink, SynonymResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_integrate(result: &IntegrateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_synonyms(result: &SynonymResult) -> io::Result<()> {
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

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_integrate(result: &IntegrateResult) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "integrated by {}", result.key)?;
        writeln!(stdout, "  files:            {}", result.files)?;
        writeln!(stdout, "  records:          {}", result.records)?;
        writeln!(stdout, "  dropped (no key): {}", result.discarded)?;
        writeln!(stdout, "  entities:         {}", result.entities)?;
        writeln!(stdout, "  merged groups:    {}", result.merged_groups)?;
        writeln!(stdout, "  ambiguous fields: {}", result.ambiguous_fields)?;
        if result.nonstandard_inchikeys > 0 {
            writeln!(
                stdout,
                "  non-standard InChIKeys: {}",
                result.nonstandard_inchikeys
            )?;
        }
        writeln!(stdout, "  output:           {}", result.output_path)
    }

    pub fn print_synonyms(result: &SynonymResult) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "synonyms collected")?;
        writeln!(stdout, "  entities:         {}", result.entities)?;
        writeln!(stdout, "  with synonyms:    {}", result.with_synonyms)?;
        writeln!(stdout, "  names filled:     {}", result.names_filled)?;
        writeln!(stdout, "  synonyms:         {}", result.synonyms)?;
        writeln!(stdout, "  synonym table:    {}", result.synonyms_path)?;
        writeln!(stdout, "  compound table:   {}", result.compounds_path)
    }
}

/// Forwards progress events to the log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(
                elapsed_ms = elapsed_ms(elapsed),
                "{}",
                event.message
            ),
            None => info!("{}", event.message),
        }
    }
}

/// Milliseconds for log fields, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
