use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// 单条规则的命中结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "id")]
    pub rule_id: String,
    pub label: String,
    pub score: i32,
}

impl Display for MatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) score={}", self.label, self.rule_id, self.score)
    }
}
