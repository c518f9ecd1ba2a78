// ============================================================
// Error Types
// ============================================================
// Configuration and lookup failures raised by the input
// stacker and the interaction layers.
//
// Schema and sizing variants are raised while a module is
// being BUILT. MissingField, FieldCountMismatch and EmptyBatch
// come from a forward pass; the Out-of-range variants from
// schema lookups. Shape errors inside burn's own tensor ops are
// not wrapped here.
//
// The application and CLI layers work with anyhow::Result and
// convert these with `?`.

use thiserror::Error;

/// Errors produced while building or calling CTR modules.
#[derive(Debug, Error)]
pub enum CtrError {
    /// A stacker or concat schema was given no entries.
    #[error("schema must contain at least one entry")]
    EmptySchema,

    /// A schema entry reports a different embedding width than the first one.
    #[error("all inputs embed_size must be the same: entry {position} has {actual}, expected {expected}")]
    EmbedSizeMismatch {
        position: usize,
        expected: usize,
        actual:   usize,
    },

    /// A schema entry lists no field names.
    #[error("schema entry {position} does not name any field")]
    NoFields { position: usize },

    /// A sequence embedding was registered without its length field.
    #[error("schema entry {position} needs a length field as its extra argument")]
    MissingExtraField { position: usize },

    /// A concat input was placed inside another concat input.
    #[error("schema entry {position}: concat inputs cannot be nested inside concat inputs")]
    NestedConcat { position: usize },

    /// Position lookup past the end of the schema.
    #[error("schema position {position} is out of range (schema has {len} entries)")]
    PositionOutOfRange { position: usize, len: usize },

    /// Range lookup past the end of the schema.
    #[error("schema range {start}..{end} is out of bounds (schema has {len} entries)")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    /// A field named by the schema is absent from the feature batch.
    #[error("feature batch has no field named '{0}'")]
    MissingField(String),

    /// An input produced a different field count than its schema
    /// declares, or concat children disagree on it.
    #[error("field count mismatch: expected {expected}, got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },

    /// The attentional layer needs at least one pair of fields.
    #[error("pairwise interaction needs at least 2 fields, got {num_fields}")]
    TooFewFields { num_fields: usize },

    /// Bilinear layer sizing did not follow exactly one scheme.
    #[error(
        "invalid bilinear sizing (embed_size={embed_size:?}, num_fields={num_fields:?}, \
         inputs_size={inputs_size:?}): give either embed_size and num_fields, or inputs_size alone"
    )]
    InvalidSizing {
        embed_size:  Option<usize>,
        num_fields:  Option<usize>,
        inputs_size: Option<usize>,
    },

    /// A batch with zero samples was handed to the batcher or a layer.
    #[error("batch is empty")]
    EmptyBatch,
}

/// Result alias for fallible CTR module operations.
pub type CtrResult<T> = Result<T, CtrError>;

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CtrError::EmbedSizeMismatch { position: 1, expected: 4, actual: 8 };
        assert!(err.to_string().contains("embed_size must be the same"));

        let err = CtrError::MissingField("userId".into());
        assert!(err.to_string().contains("userId"));

        let err = CtrError::InvalidSizing {
            embed_size:  Some(4),
            num_fields:  Some(3),
            inputs_size: Some(12),
        };
        assert!(err.to_string().contains("inputs_size alone"));
    }
}
