use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Code returned for labels that were never seen while fitting.
pub const FALLBACK_CODE: u32 = 0;

/// Immutable mapping from nominal labels to dense integer codes.
///
/// Codes follow the sorted order of the distinct labels, so the same set of
/// training values always produces the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    codes: BTreeMap<String, u32>,
}

/// Result of an encoding lookup that keeps unseen-label fallbacks visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCategory {
    pub code: u32,
    pub fallback: bool,
}

impl CategoryEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, label)| (label, code as u32))
            .collect();

        Self { codes }
    }

    pub fn encode(&self, label: &str) -> EncodedCategory {
        match self.codes.get(label) {
            Some(code) => EncodedCategory {
                code: *code,
                fallback: false,
            },
            None => EncodedCategory {
                code: FALLBACK_CODE,
                fallback: true,
            },
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.codes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
