//! Cutting an ordered operation list into store-sized atomic batches.

use crate::layout::change_set::StoreOp;
use crate::layout::planner::PlanError;

/// Default maximum number of operations per atomic write.
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Default maximum encoded payload per atomic write (4 MiB).
pub const DEFAULT_MAX_BYTES: usize = 4 * 1024 * 1024;

/// Bounds of a single atomic store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactLimits {
    pub max_items: usize,
    pub max_bytes: usize,
}

impl TransactLimits {
    /// Build limits; both bounds are clamped to at least 1.
    pub fn new(max_items: usize, max_bytes: usize) -> Self {
        Self {
            max_items: max_items.max(1),
            max_bytes: max_bytes.max(1),
        }
    }
}

impl Default for TransactLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS, DEFAULT_MAX_BYTES)
    }
}

/// A run of consecutive operations applied as one atomic write.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Zero-based position in the batch sequence.
    pub index: usize,
    pub ops: Vec<StoreOp>,
    pub bytes: usize,
}

/// Split `ops` into consecutive batches within `limits`, never reordering.
///
/// Fails before anything is written when a single operation is larger than
/// the payload limit on its own.
pub fn partition(ops: Vec<StoreOp>, limits: &TransactLimits) -> Result<Vec<Batch>, PlanError> {
    let mut batches: Vec<Batch> = Vec::new();
    let mut current = Batch {
        index: 0,
        ops: Vec::new(),
        bytes: 0,
    };

    for op in ops {
        let size = op.encoded_len();
        if size > limits.max_bytes {
            return Err(PlanError::PayloadTooLarge {
                kind: op.kind(),
                bytes: size,
                limit: limits.max_bytes,
            });
        }

        let full = current.ops.len() >= limits.max_items || current.bytes + size > limits.max_bytes;
        if full && !current.ops.is_empty() {
            let index = current.index + 1;
            batches.push(std::mem::replace(
                &mut current,
                Batch {
                    index,
                    ops: Vec::new(),
                    bytes: 0,
                },
            ));
        }
        current.bytes += size;
        current.ops.push(op);
    }

    if !current.ops.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}
