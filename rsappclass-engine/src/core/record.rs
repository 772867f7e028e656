use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// HTTP 遥测记录
/// 未声明的字段保存在 extra 中，序列化时原样输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub uri: String,
    #[serde(default, deserialize_with = "de_lenient_map")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "de_lenient_map")]
    pub cookies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub user_agent: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON 标量转文本：null → 空串，字符串原样，其余按 JSON 文本
fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn de_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(value_to_text).unwrap_or_default())
}

fn de_lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, value_to_text(v)))
        .collect())
}

impl TelemetryRecord {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// 匹配前的小写化视图，每条记录只构建一次，供所有规则复用
#[derive(Debug, Clone, Default)]
pub struct PreparedRecord {
    pub uri: String,
    /// "<name>: <value>" 形式的 Header 行
    pub header_lines: Vec<String>,
    pub cookie_names: Vec<String>,
    pub user_agent: String,
}

impl From<&TelemetryRecord> for PreparedRecord {
    fn from(record: &TelemetryRecord) -> Self {
        Self {
            uri: record.uri.to_lowercase(),
            header_lines: record
                .headers
                .iter()
                .map(|(k, v)| format!("{}: {}", k.to_lowercase(), v.to_lowercase()))
                .collect(),
            cookie_names: record.cookies.keys().map(|k| k.to_lowercase()).collect(),
            user_agent: record.user_agent.to_lowercase(),
        }
    }
}
