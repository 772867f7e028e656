use crate::core::{CompiledRule, PreparedRecord};

use super::Signal;

// URI 子串
pub struct UriSignal;

impl Signal for UriSignal {
    const TYPE_NAME: &'static str = "URI";
    const BONUS: i32 = 40;

    fn is_hit(rule: &CompiledRule, record: &PreparedRecord) -> bool {
        rule.uri_substr.iter().any(|s| record.uri.contains(s.as_str()))
    }
}
