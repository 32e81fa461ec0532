use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 分類請求；`text` 若不是字串會被轉成字串，不會失敗
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationRequest {
    #[serde(default, deserialize_with = "coerce_text")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub confidence: f64,
    pub all_probas: BTreeMap<String, f64>,
}

/// `/predict` 的回應：原始文字加上分類結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub text: String,
    pub category: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub all_probas: BTreeMap<String, f64>,
}

impl ClassificationResponse {
    pub fn new(text: String, result: ClassificationResult) -> Self {
        Self {
            text,
            category: result.category,
            confidence: result.confidence,
            all_probas: result.all_probas,
        }
    }
}

fn coerce_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "New", alias = "Новый")]
    New,
    #[serde(rename = "In-Progress", alias = "В работе")]
    InProgress,
    #[serde(rename = "Closed", alias = "Закрыт")]
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "New",
            TicketStatus::InProgress => "In-Progress",
            TicketStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" | "новый" => Ok(TicketStatus::New),
            "in-progress" | "in_progress" | "inprogress" | "в работе" => {
                Ok(TicketStatus::InProgress)
            }
            "closed" | "закрыт" => Ok(TicketStatus::Closed),
            other => Err(format!(
                "unknown status '{}', expected one of: New, In-Progress, Closed",
                other
            )),
        }
    }
}

/// 存在 tickets.json 裡的一筆工單；缺少或型別不對的欄位使用預設值
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    #[serde(deserialize_with = "coerce_text")]
    pub name: String,
    #[serde(deserialize_with = "coerce_text")]
    pub email: String,
    #[serde(deserialize_with = "coerce_text")]
    pub text: String,
    #[serde(deserialize_with = "coerce_text")]
    pub category: String,
    #[serde(deserialize_with = "lenient_confidence")]
    pub confidence: f64,
    #[serde(deserialize_with = "lenient_status")]
    pub status: TicketStatus,
    #[serde(deserialize_with = "coerce_text")]
    pub timestamp: String,
    #[serde(deserialize_with = "coerce_text")]
    pub admin_response: String,
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

// 舊資料的 confidence 可能是字串或空值
fn lenient_confidence<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let confidence = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    };
    Ok(if confidence.is_finite() { confidence } else { 0.0 })
}

// 空白或不認得的狀態視為新工單
fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<TicketStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.parse().unwrap_or_default(),
        _ => TicketStatus::New,
    })
}

const PREVIEW_CHARS: usize = 30;

impl Ticket {
    pub fn response_preview(&self) -> String {
        if self.admin_response.is_empty() {
            return "—".to_string();
        }
        if self.admin_response.chars().count() > PREVIEW_CHARS {
            let head: String = self.admin_response.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.admin_response.clone()
        }
    }

    pub fn is_spam(&self) -> bool {
        self.category.to_lowercase().contains("спам")
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub name: String,
    pub email: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub category: Option<String>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.map_or(true, |s| ticket.status == s)
            && self
                .category
                .as_deref()
                .map_or(true, |c| ticket.category == c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_coerces_non_string_text() {
        let req: ClassificationRequest = serde_json::from_str(r#"{"text": 42}"#).unwrap();
        assert_eq!(req.text, "42");

        let req: ClassificationRequest = serde_json::from_str(r#"{"text": null}"#).unwrap();
        assert_eq!(req.text, "");

        let req: ClassificationRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(req.text, "");

        let req: ClassificationRequest =
            serde_json::from_str(r#"{"text": ["a", true]}"#).unwrap();
        assert_eq!(req.text, r#"["a",true]"#);
    }

    #[test]
    fn test_ticket_reads_legacy_record() {
        let json = r#"{
            "id": 3,
            "name": "Иван",
            "text": "Не работает почта",
            "category": "Почта",
            "status": "В работе",
            "timestamp": "2024-05-01 10:00:00"
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();

        assert_eq!(ticket.id, 3);
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.email, "");
        assert_eq!(ticket.admin_response, "");
        assert_eq!(ticket.confidence, 0.0);

        let out = serde_json::to_value(&ticket).unwrap();
        assert_eq!(out["status"], "In-Progress");
    }

    #[test]
    fn test_ticket_tolerates_malformed_fields() {
        let json = r#"{
            "id": "5",
            "name": null,
            "email": "",
            "text": 12345,
            "category": "",
            "confidence": "n/a",
            "status": "",
            "timestamp": null,
            "admin_response": null
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();

        assert_eq!(ticket.id, 5);
        assert_eq!(ticket.name, "");
        assert_eq!(ticket.text, "12345");
        assert_eq!(ticket.confidence, 0.0);
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.timestamp, "");

        let ticket: Ticket =
            serde_json::from_str(r#"{"confidence": "0.75", "status": "archived"}"#).unwrap();
        assert_eq!(ticket.confidence, 0.75);
        assert_eq!(ticket.status, TicketStatus::New);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("new".parse::<TicketStatus>().unwrap(), TicketStatus::New);
        assert_eq!(
            "In-Progress".parse::<TicketStatus>().unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!("Закрыт".parse::<TicketStatus>().unwrap(), TicketStatus::Closed);
        assert!("archived".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_response_preview() {
        let mut ticket = Ticket::default();
        assert_eq!(ticket.response_preview(), "—");

        ticket.admin_response = "Перезагрузите роутер".to_string();
        assert_eq!(ticket.response_preview(), "Перезагрузите роутер");

        ticket.admin_response = "а".repeat(31);
        assert_eq!(ticket.response_preview(), format!("{}...", "а".repeat(30)));
    }

    #[test]
    fn test_filter_matches() {
        let ticket = Ticket {
            category: "Оплата".to_string(),
            status: TicketStatus::New,
            ..Default::default()
        };

        assert!(TicketFilter::default().matches(&ticket));
        assert!(TicketFilter {
            status: Some(TicketStatus::New),
            category: Some("Оплата".to_string()),
        }
        .matches(&ticket));
        assert!(!TicketFilter {
            status: Some(TicketStatus::Closed),
            category: None,
        }
        .matches(&ticket));
    }
}
