use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Point-in-time copy of [`CodecStats`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecStatsSnapshot {
    /// Nodes encoded successfully
    pub encodes: u64,
    /// Total serialized bytes produced by successful encodes
    pub bytes_encoded: u64,
    /// Buffers decoded successfully
    pub decodes: u64,
    /// Encodes refused because the node did not fit
    pub capacity_rejections: u64,
    /// Decodes refused because the buffer was malformed
    pub malformed_rejections: u64,
}

impl CodecStatsSnapshot {
    /// Average serialized size of an encoded node, or 0 before the first encode.
    pub fn mean_encoded_size(&self) -> u64 {
        if self.encodes == 0 {
            0
        } else {
            self.bytes_encoded / self.encodes
        }
    }
}

/// Thread-safe counters kept by a [`super::NodeCodec`].
#[derive(Default, Debug)]
pub struct CodecStats {
    encodes: AtomicU64,
    bytes_encoded: AtomicU64,
    decodes: AtomicU64,
    capacity_rejections: AtomicU64,
    malformed_rejections: AtomicU64,
}

impl CodecStats {
    /// Returns the number of successful encodes.
    pub fn encodes(&self) -> u64 {
        self.encodes.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of successful decodes.
    pub fn decodes(&self) -> u64 {
        self.decodes.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of encodes refused for capacity.
    pub fn capacity_rejections(&self) -> u64 {
        self.capacity_rejections.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of decodes refused as malformed.
    pub fn malformed_rejections(&self) -> u64 {
        self.malformed_rejections.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn record_encode(&self, size: usize) {
        self.encodes.fetch_add(1, AtomicOrdering::Relaxed);
        self.bytes_encoded
            .fetch_add(size as u64, AtomicOrdering::Relaxed);
    }

    pub(crate) fn record_decode(&self) {
        self.decodes.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_capacity_rejections(&self) {
        self.capacity_rejections
            .fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_malformed_rejections(&self) {
        self.malformed_rejections
            .fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Creates a snapshot of all current statistics.
    pub fn snapshot(&self) -> CodecStatsSnapshot {
        CodecStatsSnapshot {
            encodes: self.encodes(),
            bytes_encoded: self.bytes_encoded.load(AtomicOrdering::Relaxed),
            decodes: self.decodes(),
            capacity_rejections: self.capacity_rejections(),
            malformed_rejections: self.malformed_rejections(),
        }
    }

    /// Emits current statistics to the tracing infrastructure.
    pub fn emit_tracing(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target: "bptree_node::stats",
            encodes = snapshot.encodes,
            bytes_encoded = snapshot.bytes_encoded,
            mean_encoded_size = snapshot.mean_encoded_size(),
            decodes = snapshot.decodes,
            capacity_rejections = snapshot.capacity_rejections,
            malformed_rejections = snapshot.malformed_rejections,
            "node codec stats snapshot"
        );
    }
}
