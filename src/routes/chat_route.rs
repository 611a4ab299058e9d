use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    dal::chat_db,
    services::{ChatClient, ChatError, ChatMessage, GroqClient},
};

const ANALYST_SYSTEM_PROMPT: &str =
    "You are a lead engagement strategist. You help users qualify leads and plan outreach.";

#[derive(Deserialize)]
struct ChatBody {
    user_id: String,
    message: String,
}

#[post("")]
async fn chat(
    body: web::Json<ChatBody>,
    pool: web::Data<PgPool>,
    groq_client: web::Data<GroqClient>,
) -> HttpResponse {
    let mut conversation = match chat_db::load_conversation(&body.user_id, &pool).await {
        Ok(conversation) => conversation,
        Err(e) => {
            log::error!("Error loading conversation: {:?}", e);
            vec![]
        }
    };

    let mut new_messages = vec![];
    if conversation.is_empty() {
        new_messages.push(ChatMessage::system(ANALYST_SYSTEM_PROMPT));
    }
    new_messages.push(ChatMessage::user(&body.message));
    conversation.extend(new_messages.clone());

    // API trouble never surfaces as a 5xx; the analyst apologizes instead.
    let reply = match groq_client.generate(&conversation).await {
        Ok(reply) => reply,
        Err(e @ ChatError::Provider(_)) => {
            log::error!("Chat API error: {}", e);
            "An unexpected error occurred. Please try again.".to_string()
        }
        Err(e) => {
            log::error!("Chat API error: {}", e);
            "I'm having trouble connecting to the AI service. Please try again later.".to_string()
        }
    };

    new_messages.push(ChatMessage::assistant(&reply));
    if let Err(e) = chat_db::append_messages(&body.user_id, &new_messages, &pool).await {
        log::error!("Error saving conversation: {:?}", e);
    }

    HttpResponse::Ok().json(serde_json::json!({ "reply": reply }))
}
