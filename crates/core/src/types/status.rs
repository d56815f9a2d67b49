//! Status enums for catalog products and workflow runs.

use serde::{Deserialize, Serialize};

/// Publication status of a catalog product.
///
/// Products imported from the ERP are always forced to [`ProductStatus::Published`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "catalog.product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Proposed,
    Published,
    Rejected,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Proposed => write!(f, "proposed"),
            Self::Published => write!(f, "published"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "proposed" => Ok(Self::Proposed),
            "published" => Ok(Self::Published),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}

/// Lifecycle of a recorded workflow execution.
///
/// A run starts as `Running` and ends in exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.sync_run_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Running,
    Succeeded,
    Failed,
}

impl SyncRunStatus {
    /// Whether the run has finished (successfully or not).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_round_trip() {
        for status in [
            ProductStatus::Draft,
            ProductStatus::Proposed,
            ProductStatus::Published,
            ProductStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<ProductStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_product_status_rejects_unknown() {
        assert!("active".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn test_product_status_serde() {
        let json = serde_json::to_string(&ProductStatus::Published).unwrap_or_default();
        assert_eq!(json, "\"published\"");
    }

    #[test]
    fn test_sync_run_terminal_states() {
        assert!(!SyncRunStatus::Running.is_terminal());
        assert!(SyncRunStatus::Succeeded.is_terminal());
        assert!(SyncRunStatus::Failed.is_terminal());
    }
}
