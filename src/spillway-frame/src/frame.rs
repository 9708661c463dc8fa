//! Partitioned collections.

use arrow::compute::concat_batches;
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

use common_error::{SpillwayError, SpillwayResult};
use spillway_core::{Partition, ProxyCapability, ProxyTree, Value};

/// A distributed collection: a schema and one value per partition.
///
/// Partitions are normally [`Value::Partition`]; proxies appear while a
/// shuffle is in flight.
#[derive(Debug, Clone)]
pub struct PartitionedFrame {
    schema: SchemaRef,
    partitions: Vec<Value>,
}

impl PartitionedFrame {
    /// Create a frame from partition values.
    pub fn new(schema: SchemaRef, partitions: Vec<Value>) -> Self {
        Self { schema, partitions }
    }

    /// Create a frame from materialized partitions.
    pub fn from_partitions(schema: SchemaRef, partitions: Vec<Partition>) -> Self {
        Self::new(schema, partitions.into_iter().map(Value::from).collect())
    }

    /// Create a frame of device-resident partitions, all on `ordinal`.
    pub fn on_device(schema: SchemaRef, batches: Vec<RecordBatch>, ordinal: u32) -> Self {
        Self::from_partitions(
            schema,
            batches
                .into_iter()
                .map(|b| Partition::device(b, ordinal))
                .collect(),
        )
    }

    /// Schema shared by every partition.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Partition values.
    pub fn partitions(&self) -> &[Value] {
        &self.partitions
    }

    /// Take the partition values.
    pub fn into_partitions(self) -> Vec<Value> {
        self.partitions
    }

    /// Number of partitions currently behind a proxy.
    pub fn proxy_count(&self) -> usize {
        self.partitions.iter().map(Value::count_proxies).sum()
    }

    /// Row counts per partition, looking through proxies.
    pub fn partition_rows(&self) -> SpillwayResult<Vec<usize>> {
        self.partitions
            .iter()
            .map(|v| Self::referenced(v).map(Partition::num_rows))
            .collect()
    }

    /// Total number of rows.
    pub fn num_rows(&self) -> SpillwayResult<usize> {
        Ok(self.partition_rows()?.iter().sum())
    }

    /// Record batches of every partition, in order.
    pub fn batches(&self) -> SpillwayResult<Vec<RecordBatch>> {
        self.partitions
            .iter()
            .map(|v| Self::referenced(v).map(|p| p.batch().clone()))
            .collect()
    }

    /// Concatenate all partitions into one batch.
    pub fn collect(&self) -> SpillwayResult<RecordBatch> {
        let batches = self.batches()?;
        Ok(concat_batches(&self.schema, batches.iter())?)
    }

    fn referenced(value: &Value) -> SpillwayResult<&Partition> {
        value.referenced_partition().ok_or_else(|| {
            SpillwayError::type_error(format!(
                "frame partition must be a Partition or Proxy, got {}",
                value.type_name()
            ))
        })
    }
}

impl ProxyTree for PartitionedFrame {
    fn proxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self::new(self.schema, self.partitions.proxify_with(proxies)?))
    }

    fn unproxify_with(self, proxies: &dyn ProxyCapability) -> SpillwayResult<Self> {
        Ok(Self::new(self.schema, self.partitions.unproxify_with(proxies)?))
    }
}
