//! Arrow IPC encoding of the pieces exchanged between workers.

use std::io::Cursor;

use arrow_array::RecordBatch;
use arrow_ipc::reader::StreamReader;
use arrow_ipc::writer::StreamWriter;

use common_error::{SpillwayError, SpillwayResult};

/// Arrow IPC stream codec.
pub struct IpcCodec;

impl IpcCodec {
    /// Encode batches as one IPC stream. No batches encode to no bytes.
    pub fn serialize(batches: &[RecordBatch]) -> SpillwayResult<Vec<u8>> {
        let Some(first) = batches.first() else {
            return Ok(Vec::new());
        };

        let schema = first.schema();
        let mut buffer = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut buffer, &schema).map_err(|e| {
                SpillwayError::internal(format!("failed to create IPC writer: {e}"))
            })?;
            for batch in batches {
                writer.write(batch)?;
            }
            writer.finish()?;
        }
        Ok(buffer)
    }

    /// Decode an IPC stream produced by [`IpcCodec::serialize`].
    pub fn deserialize(data: &[u8]) -> SpillwayResult<Vec<RecordBatch>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let reader = StreamReader::try_new(Cursor::new(data), None).map_err(|e| {
            SpillwayError::internal(format!("failed to create IPC reader: {e}"))
        })?;
        reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(SpillwayError::from)
    }
}
