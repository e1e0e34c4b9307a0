use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::db::{repositories::staff::StaffLookup, Staff};

use super::client::{ChatClient, ChatReply};
use super::markdown::render_markdown;

pub const UNAVAILABLE_FALLBACK: &str =
    "Sorry, the AI service is temporarily unavailable. Please check your network connection or try again later.";
pub const INVALID_RESPONSE_FALLBACK: &str = "Sorry, the AI service returned an invalid response.";
pub const GENERIC_FALLBACK: &str = "Sorry, something went wrong. Please try again later.";

/// Per-process conversation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    /// Successful exchanges so far.
    pub message_count: u64,
    /// Empty until the backend assigns one.
    pub conversation_id: String,
}

/// Prefixes the first message of a conversation with who is asking.
pub fn build_query(staff: Option<&Staff>, message_count: u64, message: &str) -> String {
    match staff {
        Some(staff) if message_count == 0 => format!("{}{message}", identity_prefix(staff)),
        _ => message.to_string(),
    }
}

fn identity_prefix(staff: &Staff) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    format!(
        "My name is {}, I work in the {} department as a {}. My email is {} and my phone number is {}. \
         I was hired on {} and my current salary is ${}. My employment status is {}. Here is my question: ",
        staff.full_name(),
        staff.dept_name,
        field(&staff.job_title),
        field(&staff.email),
        field(&staff.phone),
        staff
            .hire_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        staff.salary.map(|salary| salary.to_string()).unwrap_or_default(),
        staff.status,
    )
}

pub struct ChatService {
    client: ChatClient,
    staff: Arc<dyn StaffLookup>,
    staff_id: String,
    context: Mutex<ConversationContext>,
}

impl ChatService {
    pub fn new(client: ChatClient, staff: Arc<dyn StaffLookup>, staff_id: impl Into<String>) -> Self {
        Self {
            client,
            staff,
            staff_id: staff_id.into(),
            context: Mutex::new(ConversationContext::default()),
        }
    }

    pub async fn context(&self) -> ConversationContext {
        self.context.lock().await.clone()
    }

    /// Sends `message` and returns rendered HTML or a fallback string.
    pub async fn message_to_ai(&self, message: &str) -> String {
        match self.exchange(message).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("AI chat failed: {err:#}");
                GENERIC_FALLBACK.to_string()
            }
        }
    }

    async fn exchange(&self, message: &str) -> Result<String> {
        let staff = self.staff.get_single_staff(&self.staff_id).await?;
        if staff.is_none() {
            warn!("No staff record for {}; sending message without identity", self.staff_id);
        }

        // Held across the request so concurrent messages stay in order.
        let mut context = self.context.lock().await;
        let query = build_query(staff.as_ref(), context.message_count, message);
        info!("Sending message to AI ({} chars)", message.chars().count());

        match self.client.send(&query, &context.conversation_id).await {
            Ok(ChatReply::Answer {
                answer,
                conversation_id,
            }) => {
                context.message_count += 1;
                if let Some(id) = conversation_id {
                    context.conversation_id = id;
                }
                Ok(render_markdown(&answer))
            }
            Ok(ChatReply::Invalid) => {
                warn!("AI backend returned a response without an answer");
                Ok(INVALID_RESPONSE_FALLBACK.to_string())
            }
            Err(err) => {
                warn!("AI backend unavailable: {err:#}");
                Ok(UNAVAILABLE_FALLBACK.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn john() -> Staff {
        Staff {
            staff_id: "EMP001".into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: Some("john.doe@company.com".into()),
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 15),
            job_title: Some("Senior Engineer".into()),
            dept_name: "Engineering".into(),
            salary: Some(85000.0),
            phone: Some("555-0101".into()),
            manager_id: None,
            status: "active".into(),
        }
    }

    struct FixedStaff(Option<Staff>);

    #[async_trait]
    impl StaffLookup for FixedStaff {
        async fn get_single_staff(&self, _staff_id: &str) -> Result<Option<Staff>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenStaff;

    #[async_trait]
    impl StaffLookup for BrokenStaff {
        async fn get_single_staff(&self, _staff_id: &str) -> Result<Option<Staff>> {
            anyhow::bail!("database is locked")
        }
    }

    fn service(server: &MockServer, staff: Arc<dyn StaffLookup>) -> ChatService {
        let client = ChatClient::new(
            format!("{}/v1/chat-messages", server.uri()),
            Some("test-key".into()),
            "flabba-pet",
        )
        .expect("client");
        ChatService::new(client, staff, "EMP001")
    }

    fn queries(requests: &[Request]) -> Vec<String> {
        requests
            .iter()
            .map(|request| {
                let body: serde_json::Value = request.body_json().expect("json body");
                body["query"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }

    #[test]
    fn identity_is_only_added_to_the_first_message() {
        let staff = john();
        let first = build_query(Some(&staff), 0, "How many leave days do I have?");
        assert!(first.starts_with("My name is John Doe, I work in the Engineering department"));
        assert!(first.contains("my current salary is $85000"));
        assert!(first.ends_with("Here is my question: How many leave days do I have?"));

        assert_eq!(build_query(Some(&staff), 1, "thanks"), "thanks");
        assert_eq!(build_query(None, 0, "hello"), "hello");
    }

    #[tokio::test]
    async fn successful_exchange_renders_and_tracks_conversation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat-messages"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "inputs": {},
                "response_mode": "blocking",
                "auto_generate_name": true,
                "user": "flabba-pet",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "You have **12** days left.",
                "conversation_id": "conv-1"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let chat = service(&server, Arc::new(FixedStaff(Some(john()))));
        let reply = chat.message_to_ai("How many leave days do I have?").await;
        assert_eq!(reply, "<p>You have <strong>12</strong> days left.</p>\n");
        chat.message_to_ai("thanks").await;

        let context = chat.context().await;
        assert_eq!(context.message_count, 2);
        assert_eq!(context.conversation_id, "conv-1");

        let requests = server.received_requests().await.expect("recorded requests");
        let sent = queries(&requests);
        assert!(sent[0].starts_with("My name is John Doe"));
        assert_eq!(sent[1], "thanks");

        let second: serde_json::Value = requests[1].body_json().expect("json body");
        assert_eq!(second["conversation_id"], "conv-1");
    }

    #[tokio::test]
    async fn server_error_returns_fallback_and_keeps_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "hello",
                "conversation_id": "conv-7"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let chat = service(&server, Arc::new(FixedStaff(Some(john()))));
        chat.message_to_ai("hi").await;
        let before = chat.context().await;

        let reply = chat.message_to_ai("are you there?").await;

        assert_eq!(reply, UNAVAILABLE_FALLBACK);
        assert_eq!(chat.context().await, before);
        assert_eq!(before.conversation_id, "conv-7");
    }

    #[tokio::test]
    async fn failed_first_message_still_carries_identity_next_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok"})))
            .mount(&server)
            .await;

        let chat = service(&server, Arc::new(FixedStaff(Some(john()))));
        assert_eq!(chat.message_to_ai("first").await, UNAVAILABLE_FALLBACK);
        chat.message_to_ai("second").await;

        let requests = server.received_requests().await.expect("recorded requests");
        let sent = queries(&requests);
        assert!(sent[0].starts_with("My name is"));
        assert!(sent[1].starts_with("My name is"));
        assert!(sent[1].ends_with("second"));
        assert_eq!(chat.context().await.conversation_id, "");
    }

    #[tokio::test]
    async fn answer_missing_is_an_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"event": "message"})))
            .mount(&server)
            .await;

        let chat = service(&server, Arc::new(FixedStaff(None)));
        assert_eq!(chat.message_to_ai("hello").await, INVALID_RESPONSE_FALLBACK);
        assert_eq!(chat.context().await.message_count, 0);
    }

    #[tokio::test]
    async fn staff_lookup_failure_returns_generic_fallback() {
        let server = MockServer::start().await;
        let chat = service(&server, Arc::new(BrokenStaff));

        assert_eq!(chat.message_to_ai("hello").await, GENERIC_FALLBACK);
        let requests = server.received_requests().await.expect("recorded requests");
        assert!(requests.is_empty());
    }
}
