use crate::core::{CompiledRule, PreparedRecord};

use super::Signal;

// User-Agent 子串
pub struct UserAgentSignal;

impl Signal for UserAgentSignal {
    const TYPE_NAME: &'static str = "UserAgent";
    const BONUS: i32 = 10;

    fn is_hit(rule: &CompiledRule, record: &PreparedRecord) -> bool {
        rule.ua_any.iter().any(|s| record.user_agent.contains(s.as_str()))
    }
}
