use crate::errors::PipelineError;
use std::io::Read;
use std::path::Path;
use tracing::info;
use zk_proofs::types::Row;

/// A dataset loaded from CSV. Raw rows stay in memory; only their leaves are written to disk.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let file = std::fs::File::open(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let dataset = Self::from_reader(name, file)?;
        info!(dataset = %dataset.name, rows = dataset.rows.len(), "loaded dataset");
        Ok(dataset)
    }

    /// Parse CSV with a header row. Each record's fields, in column order, form one row.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let rows = reader
            .records()
            .map(|record| record.map(|r| Row::new(r.iter())))
            .collect::<Result<Vec<_>, csv::Error>>()?;

        Ok(Self {
            name: name.into(),
            rows,
        })
    }
}
