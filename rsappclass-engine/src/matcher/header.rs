use crate::core::{CompiledRule, PreparedRecord};

use super::Signal;

// Header 正则：任意模式命中任意一行即算命中，多行/多模式命中只加分一次
pub struct HeaderSignal;

impl Signal for HeaderSignal {
    const TYPE_NAME: &'static str = "Header";
    const BONUS: i32 = 30;

    fn is_hit(rule: &CompiledRule, record: &PreparedRecord) -> bool {
        if record.header_lines.is_empty() {
            return false;
        }
        rule.header_regexes
            .iter()
            .any(|re| record.header_lines.iter().any(|line| re.is_match(line)))
    }
}
