//! Loading of the per-sample, per-gene length table and its normalisation into
//! a recovery matrix.
//!
//! The table is tab-delimited with a header row. The first column holds entity
//! identifiers; every other column is a gene. The first data row is not a
//! sample: it carries the mean reference length of each gene and is used as
//! the divisor for every sample row below it.

use crate::error::{HeatmapError, Result};
use csv::ReaderBuilder;
use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Identifier written into the reference row by the upstream length-summary step.
pub const DEFAULT_REFERENCE_ID: &str = "MeanLength";

/// The raw length table, validated but not yet normalised.
#[derive(Debug, Clone)]
pub struct LengthTable {
    pub id_column: String,
    pub genes: Vec<String>,
    pub reference: Vec<f64>,
    pub samples: Vec<SampleRow>,
}

#[derive(Debug, Clone)]
pub struct SampleRow {
    pub name: String,
    pub lengths: Vec<f64>,
}

/// Sample x gene matrix of recovery ratios, each in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryMatrix {
    samples: Vec<String>,
    genes: Vec<String>,
    // row-major, samples.len() * genes.len()
    ratios: Vec<f64>,
}

/// A single (sample, gene, ratio) observation of the tidy long form.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub sample: String,
    pub gene: String,
    pub ratio: f64,
}

/// Ratio of recovered to reference length, capped at full recovery.
pub fn recovery_ratio(sample_len: f64, reference_len: f64) -> f64 {
    let ratio = sample_len / reference_len;
    if ratio < 1.0 {
        ratio
    } else {
        1.0
    }
}

/// Read the table at `path` and turn it into a recovery matrix.
pub fn load_and_normalize(path: &Path, reference_id: &str) -> Result<RecoveryMatrix> {
    if !path.is_file() {
        return Err(HeatmapError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|_| HeatmapError::MissingFile {
        path: path.to_path_buf(),
    })?;

    info!("Loading length table {:?}...", path);
    let table = LengthTable::from_reader(file, reference_id)?;
    info!(
        "Found {} samples and {} genes",
        table.samples.len(),
        table.genes.len()
    );
    table.normalize()
}

fn csv_line(err: &csv::Error) -> u64 {
    err.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_length(value: &str, line: u64, column: &str) -> Result<f64> {
    let length: f64 = value.trim().parse().map_err(|_| {
        HeatmapError::malformed(line, Some(column), format!("{value:?} is not a number"))
    })?;
    if !length.is_finite() || length < 0.0 {
        return Err(HeatmapError::malformed(
            line,
            Some(column),
            format!("length must be a finite non-negative number, got {value:?}"),
        ));
    }
    Ok(length)
}

impl LengthTable {
    /// Parse a tab-delimited length table. Row 0 of the data section must be
    /// the reference row identified by `reference_id`.
    pub fn from_reader<R: Read>(reader: R, reference_id: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header = rdr
            .headers()
            .map_err(|e| HeatmapError::malformed(csv_line(&e), None, e.to_string()))?
            .clone();
        if header.is_empty() || header.iter().all(|h| h.trim().is_empty()) {
            return Err(HeatmapError::malformed(1, None, "header row is absent"));
        }
        if header.len() < 2 {
            return Err(HeatmapError::malformed(
                1,
                None,
                "header names no gene columns",
            ));
        }

        let id_column = header[0].to_string();
        let genes: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        let mut seen_genes = FxHashSet::default();
        for gene in &genes {
            if !seen_genes.insert(gene.as_str()) {
                return Err(HeatmapError::malformed(
                    1,
                    Some(gene),
                    "gene appears more than once in the header",
                ));
            }
        }

        let mut reference: Option<Vec<f64>> = None;
        let mut samples: Vec<SampleRow> = Vec::new();
        let mut seen_samples = FxHashSet::default();
        let mut last_line = 1;

        for result in rdr.records() {
            let record =
                result.map_err(|e| HeatmapError::malformed(csv_line(&e), None, e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(last_line + 1);
            last_line = line;

            if record.len() != header.len() {
                return Err(HeatmapError::malformed(
                    line,
                    None,
                    format!(
                        "row has {} columns but the header has {}",
                        record.len(),
                        header.len()
                    ),
                ));
            }

            let name = record[0].to_string();
            let lengths = genes
                .iter()
                .zip(record.iter().skip(1))
                .map(|(gene, value)| parse_length(value, line, gene))
                .collect::<Result<Vec<f64>>>()?;

            if reference.is_none() {
                if name != reference_id {
                    return Err(HeatmapError::malformed(
                        line,
                        Some(&id_column),
                        format!(
                            "first row must be the reference row {reference_id:?}, found {name:?}"
                        ),
                    ));
                }
                debug!("Reference row {:?} at line {}", name, line);
                reference = Some(lengths);
                continue;
            }

            if !seen_samples.insert(name.clone()) {
                return Err(HeatmapError::malformed(
                    line,
                    Some(&id_column),
                    format!("sample {name:?} appears more than once"),
                ));
            }
            samples.push(SampleRow { name, lengths });
        }

        let reference = match reference {
            Some(r) if !samples.is_empty() => r,
            _ => {
                return Err(HeatmapError::malformed(
                    last_line,
                    None,
                    "table needs a reference row and at least one sample row",
                ))
            }
        };

        Ok(LengthTable {
            id_column,
            genes,
            reference,
            samples,
        })
    }

    /// Tidy long form: one record per (sample, gene), samples in row order and
    /// genes in column order within each sample.
    pub fn recoveries(&self) -> Result<Vec<Recovery>> {
        if let Some((gene, _)) = self
            .genes
            .iter()
            .zip(&self.reference)
            .find(|(_, r)| **r == 0.0)
        {
            return Err(HeatmapError::DegenerateReference { gene: gene.clone() });
        }

        let mut records = Vec::with_capacity(self.samples.len() * self.genes.len());
        for sample in &self.samples {
            for ((gene, &reference), &length) in
                self.genes.iter().zip(&self.reference).zip(&sample.lengths)
            {
                records.push(Recovery {
                    sample: sample.name.clone(),
                    gene: gene.clone(),
                    ratio: recovery_ratio(length, reference),
                });
            }
        }
        Ok(records)
    }

    pub fn normalize(&self) -> Result<RecoveryMatrix> {
        let matrix = RecoveryMatrix::pivot(self.recoveries()?)?;
        debug!(
            "Recovery matrix is {} x {}",
            matrix.n_samples(),
            matrix.n_genes()
        );
        Ok(matrix)
    }
}

impl RecoveryMatrix {
    /// Pivot long-form records into a matrix. Samples and genes are ordered by
    /// first appearance; every (sample, gene) pair must occur exactly once.
    pub fn pivot(records: Vec<Recovery>) -> Result<Self> {
        let mut sample_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut gene_index: FxHashMap<String, usize> = FxHashMap::default();
        let mut samples = Vec::new();
        let mut genes = Vec::new();
        for record in &records {
            if !sample_index.contains_key(&record.sample) {
                sample_index.insert(record.sample.clone(), samples.len());
                samples.push(record.sample.clone());
            }
            if !gene_index.contains_key(&record.gene) {
                gene_index.insert(record.gene.clone(), genes.len());
                genes.push(record.gene.clone());
            }
        }

        let mut cells: Vec<Option<f64>> = vec![None; samples.len() * genes.len()];
        for record in records {
            let idx = sample_index[&record.sample] * genes.len() + gene_index[&record.gene];
            if cells[idx].replace(record.ratio).is_some() {
                return Err(HeatmapError::malformed(
                    0,
                    Some(&record.gene),
                    format!("duplicate entry for sample {:?}", record.sample),
                ));
            }
        }

        let ratios = cells
            .into_iter()
            .enumerate()
            .map(|(idx, cell)| {
                cell.ok_or_else(|| {
                    HeatmapError::malformed(
                        0,
                        Some(&genes[idx % genes.len()]),
                        format!("no entry for sample {:?}", samples[idx / genes.len()]),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(RecoveryMatrix {
            samples,
            genes,
            ratios,
        })
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    /// Ratio at (sample row, gene column).
    pub fn ratio(&self, sample: usize, gene: usize) -> f64 {
        self.ratios[sample * self.genes.len() + gene]
    }

    pub fn row(&self, sample: usize) -> &[f64] {
        let n = self.genes.len();
        &self.ratios[sample * n..(sample + 1) * n]
    }

    /// Look a cell up by identifiers.
    pub fn get(&self, sample: &str, gene: &str) -> Option<f64> {
        let s = self.samples.iter().position(|name| name == sample)?;
        let g = self.genes.iter().position(|name| name == gene)?;
        Some(self.ratio(s, g))
    }
}
