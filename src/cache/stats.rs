use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 缓存后端诊断信息，供监控面板展示
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// 例如 "1.02M"
    pub memory: String,
    /// db 名 -> 原始信息，例如 "db0" -> "keys=3,expires=1,avg_ttl=0"
    pub keyspace: HashMap<String, String>,
    pub connected_clients: u64,
    /// 秒
    pub uptime: u64,
}

impl CacheStats {
    /// 解析 INFO 文本，缺失或无法解析的字段保持默认值
    pub fn from_info(info: &str) -> Self {
        let mut stats = CacheStats::default();

        for line in info.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };

            match name {
                "used_memory_human" => stats.memory = value.to_string(),
                "connected_clients" => stats.connected_clients = value.parse().unwrap_or(0),
                "uptime_in_seconds" => stats.uptime = value.parse().unwrap_or(0),
                db if db.len() > 2 && db.starts_with("db") && db[2..].chars().all(|c| c.is_ascii_digit()) => {
                    stats.keyspace.insert(db.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Server\r\nredis_version:7.2.4\r\nuptime_in_seconds:86400\r\n\r\n\
# Clients\r\nconnected_clients:12\r\n\r\n# Memory\r\nused_memory:1068736\r\n\
used_memory_human:1.02M\r\n\r\n# Keyspace\r\ndb0:keys=42,expires=7,avg_ttl=1200\r\n\
db3:keys=1,expires=0,avg_ttl=0\r\n";

    #[test]
    fn parses_full_report() {
        let stats = CacheStats::from_info(SAMPLE);

        assert_eq!(stats.memory, "1.02M");
        assert_eq!(stats.connected_clients, 12);
        assert_eq!(stats.uptime, 86400);
        assert_eq!(stats.keyspace.len(), 2);
        assert_eq!(stats.keyspace["db0"], "keys=42,expires=7,avg_ttl=1200");
        assert_eq!(stats.keyspace["db3"], "keys=1,expires=0,avg_ttl=0");
    }

    #[test]
    fn missing_fields_default() {
        let stats = CacheStats::from_info("# Server\r\nconnected_clients:abc\r\n");
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let json = serde_json::to_value(CacheStats::from_info(SAMPLE)).expect("serialize");
        assert_eq!(json["connectedClients"], 12);
        assert_eq!(json["uptime"], 86400);
        assert!(json["keyspace"]["db0"].is_string());
    }
}
