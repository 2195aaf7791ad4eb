// src/table.rs

use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// CSV sink with a fixed header.
///
/// The header goes out on construction, so a run that yields no records still
/// leaves a valid header-only file. Each row is flushed as soon as it is written.
pub struct RowWriter<W: Write> {
    inner: csv::Writer<W>,
    rows: usize,
}

impl RowWriter<File> {
    /// Create (or truncate) `path`, making parent directories as needed.
    pub fn create<P: AsRef<Path>>(path: P, header: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
        Self::new(file, header)
    }
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W, header: &[&str]) -> Result<Self> {
        let mut inner = WriterBuilder::new().has_headers(false).from_writer(writer);
        inner.write_record(header).context("writing CSV header")?;
        inner.flush()?;
        Ok(Self { inner, rows: 0 })
    }

    pub fn write<R: Serialize>(&mut self, row: &R) -> Result<()> {
        self.inner.serialize(row).context("writing CSV row")?;
        self.inner.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| anyhow!("flushing CSV writer: {}", e.error()))
    }
}
