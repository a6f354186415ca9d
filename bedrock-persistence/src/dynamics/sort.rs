//! Sort keys for composite ordering

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9)
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    /// Descending order (Z-A, 9-0)
    #[serde(alias = "descending")]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// A single ordering key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// The field to order by
    pub field: String,
    /// The sort direction
    #[serde(default)]
    pub dir: SortDirection,
}

impl Sort {
    /// Create a sort key
    pub fn new(field: impl Into<String>, dir: SortDirection) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }

    /// Ascending sort on a field
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    /// Descending sort on a field
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display() {
        assert_eq!(format!("{}", SortDirection::Asc), "asc");
        assert_eq!(format!("{}", SortDirection::Desc), "desc");
    }

    #[test]
    fn test_direction_default() {
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }

    #[test]
    fn test_sort_display() {
        assert_eq!(format!("{}", Sort::desc("created_at")), "created_at desc");
    }

    #[test]
    fn test_serde_lowercase() {
        let sort: Sort = serde_json::from_str(r#"{ "field": "name", "dir": "desc" }"#).unwrap();
        assert_eq!(sort.dir, SortDirection::Desc);

        let sort: Sort = serde_json::from_str(r#"{ "field": "name" }"#).unwrap();
        assert_eq!(sort.dir, SortDirection::Asc);
    }
}
