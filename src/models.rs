use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 卡片预览的最大字符数
pub const PREVIEW_CHARS: usize = 200;

/// 服务端分配的 pin 编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub i64);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 列表排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    /// 查询参数取值
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Newest,
        }
    }
}

/// 评论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// 一条公开文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub description: Option<String>,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u64,
    /// 只有详情请求才会带上评论
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl Pin {
    /// 卡片上显示的内容：前 200 个字符，超出部分以 `...` 结尾
    pub fn preview(&self) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    /// 标题为空时退化为 `Pin #id`
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("Pin #{}", self.id),
        }
    }

    pub fn local_created_at(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

/// 创建请求的草稿内容
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPin {
    pub title: String,
    pub description: String,
    pub content: String,
}

/// 评论请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    pub pin_id: PinId,
    pub username: String,
    pub content: String,
}

/// 点赞响应
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LikeOutcome {
    pub likes_count: u64,
    #[serde(default)]
    pub liked: Option<bool>,
}

/// POST 请求体，`action` 字段区分三种操作
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PinRequest<'a> {
    Create {
        title: &'a str,
        description: &'a str,
        content: &'a str,
    },
    Like {
        pin_id: PinId,
    },
    Comment {
        pin_id: PinId,
        username: &'a str,
        content: &'a str,
    },
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// 解析服务端时间戳：RFC 3339，或 `2024-05-01 12:30:00.123456[+00:00]`
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp '{raw}'")))
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_service_timestamp() {
        let ts = parse_timestamp("2024-05-01 12:30:45.123456").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 5, 1));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (12, 30, 45));
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-05-01 12:30:45+03:00").unwrap();
        assert_eq!(ts.hour(), 9);
        let rfc = parse_timestamp("2024-05-01T12:30:45Z").unwrap();
        assert_eq!(rfc.hour(), 12);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_deserialize_list_entry() {
        let json = r#"{
            "id": 7,
            "title": "",
            "description": null,
            "content": "hello world",
            "created_at": "2024-05-01 12:30:45.5",
            "likes_count": 3
        }"#;
        let pin: Pin = serde_json::from_str(json).unwrap();
        assert_eq!(pin.id, PinId(7));
        assert_eq!(pin.title, None);
        assert_eq!(pin.description, None);
        assert_eq!(pin.likes_count, 3);
        assert!(pin.comments.is_none());
        assert_eq!(pin.display_title(), "Pin #7");
    }

    #[test]
    fn test_deserialize_detail_with_comments() {
        let json = r#"{
            "id": 1,
            "title": "Notes",
            "description": "short",
            "content": "x",
            "created_at": "2024-05-01T10:00:00+00:00",
            "likes_count": 0,
            "comments": [
                {"id": 1, "username": "ann", "content": "first", "created_at": "2024-05-01 10:01:00"},
                {"id": 2, "username": "bob", "content": "second", "created_at": "2024-05-01 10:02:00"}
            ]
        }"#;
        let pin: Pin = serde_json::from_str(json).unwrap();
        let comments = pin.comments.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].username, "ann");
        assert_eq!(comments[1].content, "second");
        assert_eq!(pin.title.as_deref(), Some("Notes"));
    }

    #[test]
    fn test_preview_truncates_at_200_chars() {
        let short = fixtures::pin(1, "hello world");
        assert_eq!(short.preview(), "hello world");

        let exact = fixtures::pin(2, &"a".repeat(PREVIEW_CHARS));
        assert_eq!(exact.preview().chars().count(), PREVIEW_CHARS);

        let long = fixtures::pin(3, &"я".repeat(250));
        let preview = long.preview();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_request_bodies() {
        let like = serde_json::to_value(PinRequest::Like { pin_id: PinId(5) }).unwrap();
        assert_eq!(like, serde_json::json!({"action": "like", "pin_id": 5}));

        let comment = serde_json::to_value(PinRequest::Comment {
            pin_id: PinId(5),
            username: "Anonymous",
            content: "nice",
        })
        .unwrap();
        assert_eq!(
            comment,
            serde_json::json!({"action": "comment", "pin_id": 5, "username": "Anonymous", "content": "nice"})
        );

        let create = serde_json::to_value(PinRequest::Create {
            title: "",
            description: "",
            content: "body",
        })
        .unwrap();
        assert_eq!(create["action"], "create");
        assert_eq!(create["content"], "body");
    }

    #[test]
    fn test_like_outcome_without_flag() {
        let outcome: LikeOutcome = serde_json::from_str(r#"{"likes_count": 4}"#).unwrap();
        assert_eq!(outcome.likes_count, 4);
        assert_eq!(outcome.liked, None);
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::default().as_param(), "newest");
        assert_eq!(SortOrder::Newest.toggled(), SortOrder::Oldest);
        assert_eq!(SortOrder::Oldest.toggled().as_param(), "newest");
    }
}
