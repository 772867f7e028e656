//! rsappclass-engine 内核错误定义
//! 封装内核层所有核心错误，与业务层错误解耦，基于thiserror实现类型安全处理
use thiserror::Error;

use regex::Error as RegexError;

/// 内核核心错误枚举
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================== 规则相关错误 =====================
    /// 规则库为空（规则库必须至少包含一条规则）
    #[error("Rule store is empty: {0}")]
    EmptyRuleStore(String),

    // ===================== 编译相关错误 =====================
    /// 正则表达式编译失败
    #[error("Regex compilation failed: {0}")]
    RegexCompileError(#[from] RegexError),
}

/// 内核层全局Result类型别名
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compile_header_pattern;

    #[test]
    fn test_error_sources() {
        let err = compile_header_pattern("server: (nginx").unwrap_err();
        assert!(matches!(err, CoreError::RegexCompileError(_)));
        assert!(err.to_string().starts_with("Regex compilation failed"));

        let err = crate::RuleStore::new(Vec::new()).unwrap_err();
        match err {
            CoreError::EmptyRuleStore(msg) => assert!(!msg.is_empty()),
            CoreError::RegexCompileError(e) => panic!("unexpected regex error: {}", e),
        }
    }
}
