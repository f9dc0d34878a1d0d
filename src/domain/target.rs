use serde::{Deserialize, Serialize};

/// How a monitored target is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Video channel resolved to a machine-readable feed
    #[default]
    Feed,
    /// Rendered page scraped through the browser
    Page,
}

/// One feed-registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub kind: TargetKind,
}

/// Highest priority first; ties keep registry order.
pub fn by_priority(mut targets: Vec<Target>) -> Vec<Target> {
    targets.sort_by(|a, b| b.priority.cmp(&a.priority));
    targets
}
