use crate::domain::model::{NewTicket, Ticket, TicketFilter, TicketStatus};
use crate::domain::ports::{Storage, TicketClassifier};
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::validate_optional_email;
use std::collections::BTreeSet;

pub const DEFAULT_TICKETS_FILE: &str = "tickets.json";
const ANONYMOUS_NAME: &str = "Аноним";

enum Loaded {
    Tickets(Vec<Ticket>),
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: Ticket,
    pub spam: bool,
}

/// 以 JSON 檔保存的工單列表
///
/// Every operation reads the whole file and writes it back; concurrent
/// writers overwrite each other.
pub struct TicketStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> TicketStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_file_name(storage, DEFAULT_TICKETS_FILE)
    }

    pub fn with_file_name(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    async fn reset(&self) -> Result<()> {
        self.storage.write_file(&self.file_name, b"[]").await
    }

    pub async fn load(&self) -> Result<Vec<Ticket>> {
        match self.read_tickets().await? {
            Loaded::Tickets(tickets) => Ok(tickets),
            Loaded::Unreadable(reason) => {
                tracing::warn!("{}, ignoring it", reason);
                Ok(Vec::new())
            }
        }
    }

    /// 寫入前讀取；檔案內容無法完整解析時拒絕覆寫
    async fn load_for_update(&self) -> Result<Vec<Ticket>> {
        match self.read_tickets().await? {
            Loaded::Tickets(tickets) => Ok(tickets),
            Loaded::Unreadable(reason) => Err(TriageError::UnreadableTickets {
                file: self.file_name.clone(),
                message: reason,
            }),
        }
    }

    async fn read_tickets(&self) -> Result<Loaded> {
        let bytes = match self.storage.read_file(&self.file_name).await {
            Ok(bytes) => bytes,
            Err(TriageError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Tickets file not found, creating {}", self.file_name);
                self.reset().await?;
                return Ok(Loaded::Tickets(Vec::new()));
            }
            Err(e) => return Err(e),
        };

        // 內容損壞（非 JSON 或非 UTF-8）時重設為空列表
        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Tickets file is corrupted ({}), resetting it", e);
                self.reset().await?;
                return Ok(Loaded::Tickets(Vec::new()));
            }
        };

        let items = match value {
            serde_json::Value::Array(items) => items,
            _ => {
                return Ok(Loaded::Unreadable(
                    "tickets file does not hold a list".to_string(),
                ))
            }
        };

        let mut tickets = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Ok(Loaded::Unreadable(format!(
                    "record {} in tickets file is not an object",
                    index
                )));
            }
            tickets.push(serde_json::from_value::<Ticket>(item)?);
        }

        Ok(Loaded::Tickets(tickets))
    }

    pub async fn save(&self, tickets: &[Ticket]) -> Result<()> {
        let json = serde_json::to_string_pretty(tickets)?;
        self.storage.write_file(&self.file_name, json.as_bytes()).await
    }

    /// 提交新工單：驗證、呼叫分類器、追加並保存
    pub async fn submit<C>(&self, classifier: &C, new_ticket: NewTicket) -> Result<Submission>
    where
        C: TicketClassifier + ?Sized,
    {
        if new_ticket.text.trim().is_empty() {
            return Err(TriageError::validation("Ticket text cannot be empty"));
        }
        validate_optional_email(&new_ticket.email)?;

        let result = classifier.classify_ticket(&new_ticket.text).await?;

        let mut tickets = self.load_for_update().await?;
        let id = tickets.iter().map(|t| t.id).max().unwrap_or(0) + 1;

        let name = new_ticket.name.trim();
        let ticket = Ticket {
            id,
            name: if name.is_empty() {
                ANONYMOUS_NAME.to_string()
            } else {
                name.to_string()
            },
            email: new_ticket.email.trim().to_string(),
            text: new_ticket.text.trim().to_string(),
            category: result.category,
            confidence: result.confidence,
            status: TicketStatus::New,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            admin_response: String::new(),
        };

        tickets.push(ticket.clone());
        self.save(&tickets).await?;

        tracing::info!(
            "Ticket #{} saved (category: {}, confidence: {:.3})",
            ticket.id,
            ticket.category,
            ticket.confidence
        );

        let spam = ticket.is_spam();
        Ok(Submission { ticket, spam })
    }

    pub async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let tickets = self.load().await?;
        Ok(tickets.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let tickets = self.load().await?;
        let categories: BTreeSet<String> = tickets
            .into_iter()
            .map(|t| t.category)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    pub async fn new_count(&self) -> Result<usize> {
        let tickets = self.load().await?;
        Ok(tickets
            .iter()
            .filter(|t| t.status == TicketStatus::New)
            .count())
    }

    pub async fn get(&self, id: u64) -> Result<Ticket> {
        self.load()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(TriageError::TicketNotFound { id })
    }

    /// 管理員回覆：更新狀態與回覆內容
    pub async fn respond(
        &self,
        id: u64,
        status: TicketStatus,
        response: impl Into<String>,
    ) -> Result<Ticket> {
        let mut tickets = self.load_for_update().await?;
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TriageError::TicketNotFound { id })?;

        ticket.status = status;
        ticket.admin_response = response.into();
        let updated = ticket.clone();

        self.save(&tickets).await?;
        tracing::info!("Ticket #{} updated to {}", id, status);

        Ok(updated)
    }
}
