//! Accounting for a single explicit-comms exchange.

use serde::{Deserialize, Serialize};

/// Rows and bytes moved by one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeStats {
    /// Rows sent by each input partition.
    pub rows_sent: Vec<u64>,
    /// Rows received by each output partition.
    pub rows_received: Vec<u64>,
    /// Encoded bytes sent.
    pub bytes_sent: u64,
    /// Encoded bytes received.
    pub bytes_received: u64,
    /// Messages exchanged.
    pub messages: u64,
}

impl ExchangeStats {
    /// Empty stats for an exchange between `inputs` and `outputs` partitions.
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self {
            rows_sent: vec![0; inputs],
            rows_received: vec![0; outputs],
            ..Self::default()
        }
    }

    /// Record a message sent by input `source`.
    pub fn record_sent(&mut self, source: usize, rows: u64, bytes: u64) {
        if let Some(slot) = self.rows_sent.get_mut(source) {
            *slot += rows;
        }
        self.bytes_sent += bytes;
        self.messages += 1;
    }

    /// Record a message received by output `target`.
    pub fn record_received(&mut self, target: usize, rows: u64, bytes: u64) {
        if let Some(slot) = self.rows_received.get_mut(target) {
            *slot += rows;
        }
        self.bytes_received += bytes;
    }

    /// Total rows sent.
    pub fn total_rows_sent(&self) -> u64 {
        self.rows_sent.iter().sum()
    }

    /// Total rows received.
    pub fn total_rows_received(&self) -> u64 {
        self.rows_received.iter().sum()
    }

    /// Whether everything sent was received.
    pub fn is_balanced(&self) -> bool {
        self.total_rows_sent() == self.total_rows_received() && self.bytes_sent == self.bytes_received
    }
}
