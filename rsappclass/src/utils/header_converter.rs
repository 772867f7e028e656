//! HTTP 请求 -> 遥测记录
use http::header::{HeaderMap, COOKIE, SET_COOKIE, USER_AGENT};
use http::Request;
use log::warn;
use rsappclass_engine::TelemetryRecord;

/// 单个请求最多处理的 Header 条目
const MAX_HEADER_ENTRIES: usize = 1000;

/// Header 转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 从 http::Request 构建记录，URI 取 path + query
    pub fn from_request<B>(request: &Request<B>) -> TelemetryRecord {
        let uri = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().to_string());
        Self::to_record(uri, request.headers())
    }

    /// 由 URI 与 HeaderMap 构建记录
    /// - 同名 Header 以 ", " 拼接
    /// - Cookie 请求头拆成键值对，不再保留在 headers 中
    /// - Set-Cookie 同时保留原文并提取 Cookie 名
    /// - User-Agent 只进入 user_agent 字段，不计入 headers
    pub fn to_record(uri: impl Into<String>, headers: &HeaderMap) -> TelemetryRecord {
        let mut record = TelemetryRecord::new(uri);

        for (count, (name, value)) in headers.iter().enumerate() {
            if count >= MAX_HEADER_ENTRIES {
                warn!("Header entries exceed {}, truncated", MAX_HEADER_ENTRIES);
                break;
            }
            let value = String::from_utf8_lossy(value.as_bytes());

            if name == COOKIE {
                for (k, v) in Self::parse_request_cookie(&value) {
                    record.cookies.entry(k).or_insert(v);
                }
                continue;
            }
            if name == SET_COOKIE {
                if let Some((k, v)) = Self::parse_set_cookie(&value) {
                    record.cookies.entry(k).or_insert(v);
                }
            }
            if name == USER_AGENT {
                if record.user_agent.is_empty() {
                    record.user_agent = value.to_string();
                }
                continue;
            }

            record
                .headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.to_string());
        }

        record
    }

    // Set-Cookie 只取第一段 name=value，值为 deleted 的视为删除
    fn parse_set_cookie(raw: &str) -> Option<(String, String)> {
        let core = raw.split(';').next()?.trim();
        let (name, value) = core.split_once('=')?;
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() || value.eq_ignore_ascii_case("deleted") {
            return None;
        }
        Some((name.to_string(), value.to_string()))
    }

    fn parse_request_cookie(raw: &str) -> Vec<(String, String)> {
        raw.split(';')
            .map(str::trim)
            .filter(|kv| !kv.is_empty())
            .filter_map(|kv| {
                let (name, value) = kv.split_once('=').unwrap_or((kv, ""));
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
            })
            .collect()
    }
}
