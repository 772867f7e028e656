use serde::{Deserialize, Deserializer, Serialize};

/// 规则默认权重（规则文件未声明或声明为 0 时使用）
pub const DEFAULT_WEIGHT: i32 = 50;
/// 无法识别时的兜底标签
pub const UNKNOWN_LABEL: &str = "Unknown";
/// 占位规则 ID（所有规则源均无产出时写入）
pub const BASELINE_RULE_ID: &str = "baseline";

/// 标准化指纹规则
/// 四类信号均为空时该规则永远不会产生得分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_weight", deserialize_with = "de_weight")]
    pub weight: i32,
    /// URI 子串
    #[serde(default)]
    pub uri_substr: Vec<String>,
    /// Header 正则，匹配对象为 "<name>: <value>"
    #[serde(default)]
    pub header_any: Vec<String>,
    /// Cookie 名称子串
    #[serde(default)]
    pub cookie_any: Vec<String>,
    /// User-Agent 子串
    #[serde(default)]
    pub ua_any: Vec<String>,
}

fn default_label() -> String {
    UNKNOWN_LABEL.to_string()
}

fn default_weight() -> i32 {
    DEFAULT_WEIGHT
}

// null / 0 均视为未声明
fn de_weight<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(0) => DEFAULT_WEIGHT,
        Some(w) => w.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
    })
}

impl Rule {
    /// 创建无信号规则
    pub fn new(id: impl Into<String>, label: impl Into<String>, weight: i32) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            weight,
            uri_substr: Vec::new(),
            header_any: Vec::new(),
            cookie_any: Vec::new(),
            ua_any: Vec::new(),
        }
    }

    /// 占位规则：保证规则库非空，不携带任何信号
    pub fn baseline() -> Self {
        Self::new(BASELINE_RULE_ID, "Baseline (no external rules)", 1)
    }

    pub fn with_uri_substr<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uri_substr.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn with_header_any<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_any.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn with_cookie_any<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cookie_any.extend(items.into_iter().map(Into::into));
        self
    }

    pub fn with_ua_any<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ua_any.extend(items.into_iter().map(Into::into));
        self
    }

    /// 是否不携带任何匹配信号
    pub fn has_no_signals(&self) -> bool {
        self.uri_substr.is_empty()
            && self.header_any.is_empty()
            && self.cookie_any.is_empty()
            && self.ua_any.is_empty()
    }
}
