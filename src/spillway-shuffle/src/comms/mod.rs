//! In-process explicit-comms transport.
//!
//! Every input partition acts as a worker. A worker hash-splits its partition
//! and sends each piece straight to the worker that owns the target output,
//! encoded as an Arrow IPC message. Receivers decode their inbox in sender
//! order and concatenate it, so outputs hold the same rows in the same order
//! as the task-based shuffle produces.
//!
//! ```text
//!  worker 0 ──ipc──▶ inbox 0 ──concat──▶ output 0
//!          ╲      ╱
//!           ╲    ╱
//!  worker 1 ──ipc──▶ inbox 1 ──concat──▶ output 1
//! ```

mod ipc;
mod stats;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow_array::RecordBatch;
use log::debug;
use serde::{Deserialize, Serialize};

use common_error::{value_err, SpillwayError, SpillwayResult};
use spillway_core::{Partition, Residency, Value};
use spillway_frame::{DispatchTable, HashPartitioner, PartitionedFrame, RearrangeArgs, RearrangeFn};

pub use ipc::IpcCodec;
pub use stats::ExchangeStats;

/// Explicit-comms transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CommsConfig {
    /// Largest encoded message a worker may send, in bytes.
    pub max_message_size: usize,
}

impl Default for CommsConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024 * 1024, // 64 MB
        }
    }
}

/// Running totals across every exchange run by a transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommsTotals {
    /// Exchanges completed.
    pub exchanges: u64,
    /// Messages sent.
    pub messages: u64,
    /// Encoded bytes sent.
    pub bytes_sent: u64,
}

struct Message {
    residency: Residency,
    payload: Vec<u8>,
}

/// Reference explicit-comms transport running every worker in-process.
#[derive(Debug, Default)]
pub struct LocalExplicitComms {
    config: CommsConfig,
    exchanges: AtomicU64,
    messages: AtomicU64,
    bytes_sent: AtomicU64,
}

impl LocalExplicitComms {
    /// Create a transport with the given configuration.
    pub fn new(config: CommsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Transport configuration.
    pub fn config(&self) -> &CommsConfig {
        &self.config
    }

    /// Totals across all completed exchanges.
    pub fn totals(&self) -> CommsTotals {
        CommsTotals {
            exchanges: self.exchanges.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }

    /// Expose the transport as a rearrange entry point.
    pub fn into_rearrange_fn(self: Arc<Self>) -> RearrangeFn {
        Arc::new(move |_table: &DispatchTable, args: RearrangeArgs| {
            self.exchange(args).map(|(frame, _)| frame)
        })
    }

    /// Redistribute `args.frame` by key, returning the result and its stats.
    pub fn exchange(&self, args: RearrangeArgs) -> SpillwayResult<(PartitionedFrame, ExchangeStats)> {
        let npartitions = args.output_partitions();
        if npartitions == 0 {
            value_err!("explicit-comms requires at least one output partition");
        }
        let partitioner = HashPartitioner::new(args.columns, npartitions)?;

        let schema = Arc::clone(args.frame.schema());
        let inputs = args.frame.into_partitions();
        let mut stats = ExchangeStats::new(inputs.len(), npartitions);
        let mut inboxes: Vec<Vec<Message>> = (0..npartitions).map(|_| Vec::new()).collect();

        for (source, input) in inputs.iter().enumerate() {
            let partition = input.referenced_partition().ok_or_else(|| {
                SpillwayError::type_error(format!(
                    "explicit-comms expects partitions, got {}",
                    input.type_name()
                ))
            })?;
            let pieces = partitioner.split(partition.batch())?;
            for (target, (piece, inbox)) in pieces.iter().zip(inboxes.iter_mut()).enumerate() {
                let payload = self.encode(piece, source, target)?;
                stats.record_sent(source, piece.num_rows() as u64, payload.len() as u64);
                inbox.push(Message {
                    residency: partition.residency(),
                    payload,
                });
            }
        }

        let mut outputs = Vec::with_capacity(npartitions);
        for (target, inbox) in inboxes.into_iter().enumerate() {
            let residency = inbox.first().map_or(Residency::Host, |m| m.residency);
            let mut batches = Vec::with_capacity(inbox.len());
            for message in inbox {
                let decoded = IpcCodec::deserialize(&message.payload)?;
                let rows: usize = decoded.iter().map(RecordBatch::num_rows).sum();
                stats.record_received(target, rows as u64, message.payload.len() as u64);
                batches.extend(decoded);
            }
            let merged = concat_batches(&schema, &batches)?;
            outputs.push(Value::from(Partition::new(merged, residency)));
        }

        self.exchanges.fetch_add(1, Ordering::Relaxed);
        self.messages.fetch_add(stats.messages, Ordering::Relaxed);
        self.bytes_sent.fetch_add(stats.bytes_sent, Ordering::Relaxed);
        debug!(
            "explicit-comms exchange: {} -> {} partitions, {} messages, {} rows, {} bytes",
            stats.rows_sent.len(),
            npartitions,
            stats.messages,
            stats.total_rows_sent(),
            stats.bytes_sent
        );

        Ok((PartitionedFrame::new(schema, outputs), stats))
    }

    fn encode(&self, piece: &RecordBatch, source: usize, target: usize) -> SpillwayResult<Vec<u8>> {
        let payload = IpcCodec::serialize(std::slice::from_ref(piece))?;
        if payload.len() > self.config.max_message_size {
            return Err(SpillwayError::resource_exhausted(format!(
                "message from partition {source} to {target} is {} bytes, max_message_size is {}",
                payload.len(),
                self.config.max_message_size
            )));
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema, SchemaRef};
    use spillway_core::{ProxyId, ProxyObject};

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new("k", DataType::Int64, false)]))
    }

    fn batch(values: Vec<i64>) -> RecordBatch {
        RecordBatch::try_new(schema(), vec![Arc::new(Int64Array::from(values))]).unwrap()
    }

    #[test]
    fn test_exchange_stats_balance() {
        let comms = LocalExplicitComms::default();
        let frame = PartitionedFrame::on_device(
            schema(),
            vec![batch(vec![1, 2, 3]), batch(vec![4, 5])],
            1,
        );

        let (out, stats) = comms
            .exchange(RearrangeArgs::new(frame, ["k"]).with_npartitions(3))
            .unwrap();
        assert_eq!(out.num_partitions(), 3);
        assert_eq!(out.num_rows().unwrap(), 5);
        assert_eq!(stats.messages, 6);
        assert_eq!(stats.rows_sent, vec![3, 2]);
        assert!(stats.is_balanced());
        assert!(out
            .partitions()
            .iter()
            .all(|p| p.as_partition().unwrap().residency() == Residency::Device { ordinal: 1 }));

        let totals = comms.totals();
        assert_eq!(totals.exchanges, 1);
        assert_eq!(totals.messages, 6);
    }

    #[test]
    fn test_reads_through_proxies() {
        let comms = LocalExplicitComms::default();
        let proxy = ProxyObject::new(ProxyId(3), Partition::device(batch(vec![7, 8]), 0));
        let frame = PartitionedFrame::new(schema(), vec![Value::from(proxy)]);

        let (out, _) = comms
            .exchange(RearrangeArgs::new(frame, ["k"]).with_npartitions(2))
            .unwrap();
        assert_eq!(out.num_rows().unwrap(), 2);
        assert_eq!(out.proxy_count(), 0);
    }

    #[test]
    fn test_rejects_non_partition_input() {
        let comms = LocalExplicitComms::default();
        let frame = PartitionedFrame::new(schema(), vec![Value::Int64(1)]);
        let err = comms.exchange(RearrangeArgs::new(frame, ["k"])).unwrap_err();
        assert!(matches!(err, SpillwayError::TypeError(_)));
    }

    #[test]
    fn test_message_size_limit() {
        let comms = LocalExplicitComms::new(CommsConfig {
            max_message_size: 16,
        });
        let frame = PartitionedFrame::on_device(schema(), vec![batch(vec![1, 2, 3])], 0);
        let err = comms.exchange(RearrangeArgs::new(frame, ["k"])).unwrap_err();
        assert!(err.to_string().contains("max_message_size"));
        assert_eq!(comms.totals().exchanges, 0);
    }

    #[test]
    fn test_empty_frame() {
        let comms = LocalExplicitComms::default();
        let frame = PartitionedFrame::new(schema(), vec![]);
        let (out, stats) = comms
            .exchange(RearrangeArgs::new(frame, ["k"]).with_npartitions(2))
            .unwrap();
        assert_eq!(out.partition_rows().unwrap(), vec![0, 0]);
        assert_eq!(stats.messages, 0);
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: CommsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CommsConfig::default());
        let config: CommsConfig = serde_json::from_str(r#"{"max-message-size": 1024}"#).unwrap();
        assert_eq!(config.max_message_size, 1024);
    }
}
