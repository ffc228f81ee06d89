use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry from the company organization catalog: the seed a profile is
/// grown from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OrgPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub team: String,
    /// Full name of the manager, empty for the top of the chart.
    #[serde(default)]
    pub reports_to: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub work_behavior: String,
    #[serde(default)]
    pub personal_life: String,
}

impl OrgPerson {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
