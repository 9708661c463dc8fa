//! The engine's task-based shuffle.
//!
//! A rearrange runs in two phases, each through the dispatch table so that
//! interceptions installed on the table apply:
//!
//! ```text
//!  input 0 ──shuffle_group──▶ {0: a0, 1: a1, 2: a2}
//!  input 1 ──shuffle_group──▶ {0: b0, 1: b1, 2: b2}
//!                                 │
//!  output j ◀──concat── [aj, bj] ─┘
//! ```

use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow_array::RecordBatch;
use log::debug;

use common_error::{type_err, value_err, SpillwayError, SpillwayResult};
use spillway_core::{Partition, Value};

use crate::entry::{ConcatArgs, RearrangeArgs, ShuffleGroupArgs, ShuffleGroups};
use crate::frame::PartitionedFrame;
use crate::method::ShuffleMethod;
use crate::partitioning::HashPartitioner;
use crate::table::DispatchTable;

/// Split one partition into a piece for every output partition.
///
/// A proxied input is split through the partition it refers to; the proxy
/// itself is left untouched.
pub fn shuffle_group(args: ShuffleGroupArgs) -> SpillwayResult<ShuffleGroups> {
    let Some(partition) = args.partition.referenced_partition() else {
        type_err!(
            "shuffle_group expects a partition, got {}",
            args.partition.type_name()
        );
    };

    let partitioner = HashPartitioner::new(args.columns, args.npartitions)?;
    let residency = partition.residency();
    Ok(partitioner
        .split(partition.batch())?
        .into_iter()
        .enumerate()
        .map(|(idx, piece)| (idx, Value::from(Partition::new(piece, residency))))
        .collect())
}

/// Concatenate materialized pieces into one partition.
///
/// Proxies are rejected: this function reads partition buffers directly.
pub fn concat(args: ConcatArgs) -> SpillwayResult<Value> {
    let mut parts = Vec::with_capacity(args.parts.len());
    for part in args.parts {
        match part {
            Value::Partition(p) => parts.push(p),
            other => type_err!(
                "concat requires materialized partitions, got {}",
                other.type_name()
            ),
        }
    }

    match parts.len() {
        0 => Ok(Value::from(Partition::host(RecordBatch::new_empty(
            args.schema,
        )))),
        1 => Ok(Value::from(parts.swap_remove(0))),
        _ => {
            let residency = parts[0].residency();
            let batch = concat_batches(&args.schema, parts.iter().map(Partition::batch))?;
            Ok(Value::from(Partition::new(Arc::new(batch), residency)))
        }
    }
}

/// Redistribute a frame through `shuffle_group` and `concat`.
pub fn rearrange_by_column(
    table: &DispatchTable,
    args: RearrangeArgs,
) -> SpillwayResult<PartitionedFrame> {
    match args.shuffle_method.as_deref() {
        None => {}
        Some(method) if method == ShuffleMethod::Tasks.as_str() => {}
        Some(other) => value_err!("task-based rearrange cannot run shuffle method '{other}'"),
    }

    let npartitions = args.output_partitions();
    if npartitions == 0 {
        value_err!("rearrange requires at least one output partition");
    }

    debug!(
        "task rearrange of {} partitions on {:?} into {npartitions}",
        args.frame.num_partitions(),
        args.columns
    );
    let schema = Arc::clone(args.frame.schema());
    let mut outputs: Vec<Vec<Value>> = vec![Vec::new(); npartitions];
    for partition in args.frame.into_partitions() {
        let groups = table.shuffle_group(ShuffleGroupArgs {
            partition,
            columns: args.columns.clone(),
            npartitions,
        })?;
        for (idx, piece) in groups {
            outputs
                .get_mut(idx)
                .ok_or_else(|| {
                    SpillwayError::internal(format!(
                        "shuffle_group produced output {idx} of {npartitions}"
                    ))
                })?
                .push(piece);
        }
    }

    let partitions = outputs
        .into_iter()
        .map(|parts| {
            table.concat(ConcatArgs {
                parts,
                schema: Arc::clone(&schema),
            })
        })
        .collect::<SpillwayResult<Vec<_>>>()?;

    Ok(PartitionedFrame::new(schema, partitions))
}
