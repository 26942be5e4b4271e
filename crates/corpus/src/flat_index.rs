//! Exact (brute force) squared-L2 index with a binary on-disk format.
//!
//! Layout of `index.bin`, all integers little-endian:
//!
//! | offset | size | field                        |
//! |--------|------|------------------------------|
//! | 0      | 4    | magic `ABIX`                 |
//! | 4      | 4    | format version (`u32`)       |
//! | 8      | 4    | dimension (`u32`)            |
//! | 12     | 8    | vector count (`u64`)         |
//! | 20     | 16   | build id (UUID bytes)        |
//! | 36     | ..   | `count * dimension` `f32`s   |

use crate::vector_index::{Neighbor, VectorIndex};
use alertsbot_core::{AppError, AppResult};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

const MAGIC: &[u8; 4] = b"ABIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 36;

/// Flat index storing vectors contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Write the index with its build id.
    pub fn write_to(&self, path: &Path, build_id: Uuid) -> AppResult<()> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(self.dimension as u32).to_le_bytes())?;
        writer.write_all(&(self.len() as u64).to_le_bytes())?;
        writer.write_all(build_id.as_bytes())?;
        for &value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Read an index written by [`FlatL2Index::write_to`], returning it with
    /// its build id.
    pub fn read_from(path: &Path) -> AppResult<(Self, Uuid)> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::IndexUnavailable(format!("Cannot read index {:?}: {}", path, e))
        })?;
        Self::from_bytes(&bytes)
            .map_err(|reason| AppError::IndexUnavailable(format!("Corrupt index {:?}: {}", path, reason)))
    }

    fn from_bytes(bytes: &[u8]) -> Result<(Self, Uuid), String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("file is {} bytes, shorter than header", bytes.len()));
        }

        if &bytes[0..4] != MAGIC {
            return Err("bad magic".to_string());
        }

        let version = u32::from_le_bytes(read4(bytes, 4));
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {}", version));
        }

        let dimension = u32::from_le_bytes(read4(bytes, 8)) as usize;
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[12..20]);
        let count = u64::from_le_bytes(count_bytes) as usize;

        let mut id_bytes = [0u8; 16];
        id_bytes.copy_from_slice(&bytes[20..36]);
        let build_id = Uuid::from_bytes(id_bytes);

        if dimension == 0 {
            return Err("dimension is zero".to_string());
        }

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| "header overflows".to_string())?;
        if bytes.len() != expected {
            return Err(format!(
                "expected {} bytes for {} vectors of dimension {}, found {}",
                expected,
                count,
                dimension,
                bytes.len()
            ));
        }

        let data = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok((Self { dimension, data }, build_id))
    }
}

fn read4(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len().checked_div(self.dimension).unwrap_or(0)
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> AppResult<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(AppError::Embedding(format!(
                "Cannot add vector of dimension {} to index of dimension {}",
                bad.len(),
                self.dimension
            )));
        }

        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(AppError::Embedding(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }

        if k == 0 || self.dimension == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor::new(squared_l2(query, stored), position))
            .collect();

        // Ties keep insertion order.
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}
