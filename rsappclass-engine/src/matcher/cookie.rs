use crate::core::{CompiledRule, PreparedRecord};

use super::Signal;

// Cookie 名称包含规则子串即命中，Cookie 值不参与匹配
pub struct CookieSignal;

impl Signal for CookieSignal {
    const TYPE_NAME: &'static str = "Cookie";
    const BONUS: i32 = 20;

    fn is_hit(rule: &CompiledRule, record: &PreparedRecord) -> bool {
        record
            .cookie_names
            .iter()
            .any(|name| rule.cookie_any.iter().any(|p| name.contains(p.as_str())))
    }
}
