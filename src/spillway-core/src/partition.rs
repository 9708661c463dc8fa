//! Partitions and their memory residency.

use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use serde::{Deserialize, Serialize};

/// Where a partition's buffers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Residency {
    /// Host (CPU) memory.
    Host,
    /// Memory of the device with the given ordinal.
    Device {
        /// Device ordinal on the worker.
        ordinal: u32,
    },
}

impl Residency {
    /// Whether this is device memory.
    pub fn is_device(self) -> bool {
        matches!(self, Self::Device { .. })
    }
}

impl std::fmt::Display for Residency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Device { ordinal } => write!(f, "device:{ordinal}"),
        }
    }
}

/// One partition of a distributed collection.
///
/// Cloning shares the underlying batch; contents are never copied.
#[derive(Debug, Clone)]
pub struct Partition {
    data: Arc<RecordBatch>,
    residency: Residency,
}

impl Partition {
    /// Create a partition with explicit residency.
    pub fn new(data: impl Into<Arc<RecordBatch>>, residency: Residency) -> Self {
        Self {
            data: data.into(),
            residency,
        }
    }

    /// Create a partition resident on the given device.
    pub fn device(data: impl Into<Arc<RecordBatch>>, ordinal: u32) -> Self {
        Self::new(data, Residency::Device { ordinal })
    }

    /// Create a host-resident partition.
    pub fn host(data: impl Into<Arc<RecordBatch>>) -> Self {
        Self::new(data, Residency::Host)
    }

    /// The partition's record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.data
    }

    /// Shared handle to the record batch.
    pub fn data(&self) -> &Arc<RecordBatch> {
        &self.data
    }

    /// Schema of the partition.
    pub fn schema(&self) -> SchemaRef {
        self.data.schema()
    }

    /// Memory residency.
    pub fn residency(&self) -> Residency {
        self.residency
    }

    /// Whether the partition lives in device memory.
    pub fn is_device(&self) -> bool {
        self.residency.is_device()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.data.num_rows()
    }

    /// Approximate memory footprint in bytes.
    pub fn nbytes(&self) -> usize {
        self.data.get_array_memory_size()
    }

    /// Whether both partitions share the same underlying batch.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
