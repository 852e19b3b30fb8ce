use serde::{Deserialize, Serialize};

/// Country nested inside published user records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}
