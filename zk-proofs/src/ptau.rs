//! Trusted-setup parameter catalog.
//!
//! A catalog is a directory of powers-of-tau files named `<prefix>_<k>.ptau`, where a file with
//! exponent `k` supports circuits of up to `2^k` constraints. Larger files cost more memory and
//! time to load, so selection always takes the smallest sufficient one.

use crate::constants::{PTAU_EXTENSION, PTAU_PREFIX};
use crate::error::{Result, ZkError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterFile {
    pub exponent: u32,
    pub path: PathBuf,
}

impl ParameterFile {
    /// Number of constraints the file supports.
    pub fn capacity(&self) -> u64 {
        1u64 << self.exponent
    }
}

/// Extract the capacity exponent from a file name such as `powersOfTau28_hez_final_12.ptau`.
pub fn parse_exponent(file_name: &str) -> Option<u32> {
    let stem = file_name.strip_suffix(PTAU_EXTENSION)?.strip_suffix('.')?;
    let (_, digits) = stem.rsplit_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|k| *k < u64::BITS)
}

/// Conventional Hermez file name for a capacity exponent.
pub fn hermez_file_name(exponent: u32) -> String {
    format!("{PTAU_PREFIX}_{exponent:02}.{PTAU_EXTENSION}")
}

/// Smallest `k` with `2^k >= constraints`.
pub fn required_exponent(constraints: u64) -> u32 {
    constraints
        .max(1)
        .checked_next_power_of_two()
        .map_or(u64::BITS, |p| p.trailing_zeros())
}

/// Immutable set of parameter files, ordered by exponent then path.
#[derive(Clone, Debug, Default)]
pub struct ParameterCatalog {
    entries: Vec<ParameterFile>,
}

impl ParameterCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = ParameterFile>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.exponent.cmp(&b.exponent).then_with(|| a.path.cmp(&b.path)));
        Self { entries }
    }

    /// Read the catalog from a directory. Files that do not follow the naming convention are skipped.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            // `is_file` follows symlinks; dangling links are skipped.
            if !path.is_file() {
                continue;
            }
            let exponent = path.file_name().and_then(|n| n.to_str()).and_then(parse_exponent);
            match exponent {
                Some(exponent) => entries.push(ParameterFile { exponent, path }),
                None => debug!(path = %path.display(), "ignoring file outside the ptau naming convention"),
            }
        }
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[ParameterFile] {
        &self.entries
    }

    pub fn largest(&self) -> Option<&ParameterFile> {
        self.entries.last()
    }

    /// Smallest entry whose capacity covers `required` constraints.
    pub fn select(&self, required: u64) -> Result<&ParameterFile> {
        self.entries
            .iter()
            .find(|entry| entry.capacity() >= required)
            .ok_or_else(|| ZkError::NoSuitableParameters {
                required,
                largest: match self.largest() {
                    Some(entry) => format!("2^{} ({})", entry.exponent, entry.path.display()),
                    None => "empty catalog".to_string(),
                },
            })
    }
}

/// Scan `catalog_dir` and pick the smallest parameter file for `required` constraints.
pub fn select_parameter_file(catalog_dir: &Path, required: u64) -> Result<PathBuf> {
    let catalog = ParameterCatalog::scan(catalog_dir)?;
    let selected = catalog.select(required)?;
    debug!(
        required,
        exponent = selected.exponent,
        path = %selected.path.display(),
        "selected setup parameters"
    );
    Ok(selected.path.clone())
}
