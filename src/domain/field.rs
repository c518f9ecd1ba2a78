// ============================================================
// Layer 3: Feature Field Schema
// ============================================================
// A field is one named feature column of a CTR log, e.g.
// `userId`, `movieId`, or a watch history. Every field maps
// integer ids into an embedding table of `cardinality` rows.
//
//   Categorical       exactly one id per sample
//   Sequence          up to `max_len` ids per sample, pooled,
//                     with the true length stored in a
//                     separate single-valued `length_field`
//
// Index 0 is reserved as padding for sequence fields.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Categorical,
    Sequence {
        max_len:      usize,
        length_field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name:        String,
    /// Number of embedding rows (largest id + 1)
    pub cardinality: usize,
    pub kind:        FieldKind,
}

impl FieldSpec {
    pub fn categorical(name: impl Into<String>, cardinality: usize) -> Self {
        Self { name: name.into(), cardinality, kind: FieldKind::Categorical }
    }

    pub fn sequence(
        name:         impl Into<String>,
        cardinality:  usize,
        max_len:      usize,
        length_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality,
            kind: FieldKind::Sequence { max_len, length_field: length_field.into() },
        }
    }

    /// Name of the companion length column, if this is a sequence field.
    pub fn length_field(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Categorical                     => None,
            FieldKind::Sequence { length_field, .. }   => Some(length_field),
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, FieldKind::Sequence { .. })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_field() {
        let user    = FieldSpec::categorical("userId", 10);
        let history = FieldSpec::sequence("history", 20, 5, "history_len");
        assert_eq!(user.length_field(), None);
        assert_eq!(history.length_field(), Some("history_len"));
        assert!(history.is_sequence());
        assert!(!user.is_sequence());
    }

    #[test]
    fn test_serde_roundtrip_keeps_kind() {
        let spec = FieldSpec::sequence("history", 20, 5, "history_len");
        let json = serde_json::to_string(&spec).unwrap();
        let back: FieldSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
