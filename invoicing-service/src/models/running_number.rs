//! Running number model for invoicing-service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Minimum number of digits after the prefix.
pub const RUNNING_NUMBER_WIDTH: usize = 5;

/// Kind of sequence a running number counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunningNumberType {
    Invoice,
}

impl RunningNumberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunningNumberType::Invoice => "Invoice",
        }
    }
}

/// Per-type sequential counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RunningNumber {
    pub running_number_type: String,
    pub prefix: String,
    pub current_running: i32,
}

/// Format the number that follows `last_number`: `{prefix}{last_number + 1}`,
/// zero-padded to at least [`RUNNING_NUMBER_WIDTH`] digits.
pub fn next_running_number(prefix: &str, last_number: i32) -> String {
    let counter = last_number + 1;
    format!("{}{:0width$}", prefix, counter, width = RUNNING_NUMBER_WIDTH)
}
