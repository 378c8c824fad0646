use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{TYPE_ATTRIBUTE, TYPE_METRIC};

/// The two MicroStrategy object kinds the lineage tools are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Metric,
    Attribute,
}

impl ObjectKind {
    /// Value of the `type` field on `mstr_object` records.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Metric => TYPE_METRIC,
            Self::Attribute => TYPE_ATTRIBUTE,
        }
    }

    /// Lowercase form used in tool names, e.g. `get-metric-by-guid`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Attribute => "attribute",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
