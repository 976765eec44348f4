//! Upsert strategy selection and transient-failure retry.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

/// How the attendance upsert is executed.
///
/// Chosen once when the store is constructed; never switched per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStrategy {
    /// `INSERT ... ON CONFLICT ... DO UPDATE` in one statement.
    #[default]
    Native,
    /// Plain insert, falling back to an update on a uniqueness violation.
    InsertThenUpdate,
}

impl UpsertStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            UpsertStrategy::Native => "native",
            UpsertStrategy::InsertThenUpdate => "insert_then_update",
        }
    }
}

impl fmt::Display for UpsertStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpsertStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(UpsertStrategy::Native),
            "insert_then_update" => Ok(UpsertStrategy::InsertThenUpdate),
            other => Err(format!("Unknown upsert strategy: {}", other)),
        }
    }
}

/// Runs `op`, retrying it once if the first failure is transient.
pub async fn retry_transient<T, E, F, Fut>(
    operation: &str,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    match op().await {
        Err(err) if is_transient(&err) => {
            warn!(operation, error = %err, "Transient failure, retrying once");
            op().await
        }
        other => other,
    }
}
