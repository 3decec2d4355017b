use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tetro_training::config::TrainingConfig;

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is given.
pub fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_pretty(&mut BufWriter::new(file), value)
                .with_context(|| format!("Failed to write JSON to {}", path.display()))
        }
        None => write_pretty(&mut io::stdout().lock(), value)
            .context("Failed to write JSON to stdout"),
    }
}

fn write_pretty<W, T>(writer: &mut W, value: &T) -> io::Result<()>
where
    W: io::Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Reads and validates a TOML properties file.
pub fn read_properties_file<P>(path: P) -> anyhow::Result<TrainingConfig>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read properties file: {}", path.display()))?;
    let config = TrainingConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid properties file: {}", path.display()))?;
    Ok(config)
}

/// Append-only JSON Lines file, one entry per line.
#[derive(Debug)]
pub struct ScoreLog {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ScoreLog {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open score log: {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Writes one entry and flushes it, so an interrupted run keeps every finished line.
    pub fn append<T>(&mut self, entry: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer(&mut self.writer, entry)
            .with_context(|| format!("Failed to write score log: {}", self.path.display()))?;
        writeln!(self.writer)
            .and_then(|()| self.writer.flush())
            .with_context(|| format!("Failed to write score log: {}", self.path.display()))?;
        Ok(())
    }
}
