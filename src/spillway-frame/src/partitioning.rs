//! Hash partitioning of record batches by key columns.
//!
//! Rows are hashed over their Arrow row-format encoding, so equal keys land in
//! the same output partition no matter which input partition they came from.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use arrow::compute::take_record_batch;
use arrow::row::{RowConverter, SortField};
use arrow_array::{RecordBatch, UInt32Array};

use common_error::{SpillwayError, SpillwayResult};

/// Assigns rows to output partitions by hashing key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashPartitioner {
    columns: Vec<String>,
    npartitions: usize,
}

impl HashPartitioner {
    /// Create a partitioner over `columns` into `npartitions` outputs.
    pub fn new(columns: Vec<String>, npartitions: usize) -> SpillwayResult<Self> {
        if columns.is_empty() {
            return Err(SpillwayError::value_error(
                "hash partitioning requires at least one key column",
            ));
        }
        if npartitions == 0 {
            return Err(SpillwayError::value_error(
                "hash partitioning requires at least one output partition",
            ));
        }
        Ok(Self {
            columns,
            npartitions,
        })
    }

    /// Key columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of output partitions.
    pub fn num_partitions(&self) -> usize {
        self.npartitions
    }

    /// Output partition of every row in `batch`.
    pub fn partition_indices(&self, batch: &RecordBatch) -> SpillwayResult<Vec<usize>> {
        let schema = batch.schema();
        let mut keys = Vec::with_capacity(self.columns.len());
        let mut fields = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let idx = schema.index_of(name).map_err(|_| {
                SpillwayError::column_not_found(format!(
                    "shuffle key '{name}' not in schema [{}]",
                    schema
                        .fields()
                        .iter()
                        .map(|f| f.name().as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
            fields.push(SortField::new(schema.field(idx).data_type().clone()));
            keys.push(batch.column(idx).clone());
        }

        let converter = RowConverter::new(fields)?;
        let rows = converter.convert_columns(&keys)?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut hasher = DefaultHasher::new();
                row.as_ref().hash(&mut hasher);
                (hasher.finish() % self.npartitions as u64) as usize
            })
            .collect())
    }

    /// Split a batch into exactly `npartitions` batches, some possibly empty.
    pub fn split(&self, batch: &RecordBatch) -> SpillwayResult<Vec<RecordBatch>> {
        if batch.num_rows() == 0 {
            return Ok(vec![batch.slice(0, 0); self.npartitions]);
        }

        let mut rows: Vec<Vec<u32>> = vec![Vec::new(); self.npartitions];
        for (row, target) in self.partition_indices(batch)?.into_iter().enumerate() {
            let row = u32::try_from(row).map_err(|_| {
                SpillwayError::resource_exhausted("partition exceeds u32::MAX rows")
            })?;
            rows[target].push(row);
        }

        rows.into_iter()
            .map(|indices| {
                let indices = UInt32Array::from(indices);
                take_record_batch(batch, &indices).map_err(SpillwayError::from)
            })
            .collect()
    }
}
