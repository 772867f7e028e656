//! 规则打分
//! 四个信号维度各自独立判定，命中即获得固定加分，每个维度每条规则最多加分一次

use crate::core::{CompiledRule, PreparedRecord, Rule, TelemetryRecord};

pub mod cookie;
pub mod header;
pub mod uri;
pub mod user_agent;

pub use cookie::CookieSignal;
pub use header::HeaderSignal;
pub use uri::UriSignal;
pub use user_agent::UserAgentSignal;

/// 单个信号维度的通用抽象
pub trait Signal {
    /// 维度名称，用于日志输出
    const TYPE_NAME: &'static str;
    /// 命中加分
    const BONUS: i32;

    /// 当前规则在该维度是否命中
    fn is_hit(rule: &CompiledRule, record: &PreparedRecord) -> bool;

    #[inline(always)]
    fn bonus(rule: &CompiledRule, record: &PreparedRecord) -> i32 {
        if Self::is_hit(rule, record) {
            log::trace!("[{}] rule={} hit +{}", Self::TYPE_NAME, rule.id(), Self::BONUS);
            Self::BONUS
        } else {
            0
        }
    }
}

/// 纯函数打分器，无副作用
pub struct Matcher;

impl Matcher {
    /// 各维度加分之和，取值为 {40,30,20,10} 的子集和
    pub fn delta(rule: &CompiledRule, record: &PreparedRecord) -> i32 {
        UriSignal::bonus(rule, record)
            + HeaderSignal::bonus(rule, record)
            + CookieSignal::bonus(rule, record)
            + UserAgentSignal::bonus(rule, record)
    }

    /// 最终得分：delta 为 0 时强制为 0，与权重无关；极端权重饱和而不溢出
    pub fn score(rule: &CompiledRule, record: &PreparedRecord) -> i32 {
        let delta = Self::delta(rule, record);
        if delta > 0 {
            rule.weight().saturating_add(delta)
        } else {
            0
        }
    }

    /// 直接对未编译规则打分（临时编译，适合单次调用）
    pub fn score_rule(rule: &Rule, record: &TelemetryRecord) -> i32 {
        let compiled = CompiledRule::compile(rule.clone());
        Self::score(&compiled, &PreparedRecord::from(record))
    }
}
