use sqlx::PgPool;

use crate::services::{ChatMessage, ChatRole};

#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    role: String,
    content: String,
}

fn role_to_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

fn role_from_str(role: &str) -> ChatRole {
    match role {
        "system" => ChatRole::System,
        "assistant" => ChatRole::Assistant,
        _ => ChatRole::User,
    }
}

pub async fn load_conversation(
    user_id: &str,
    pool: &PgPool,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        select
            role, content
        from
            chat_message
        where
            user_id = $1
        order by
            seq
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ChatMessage {
            role: role_from_str(&row.role),
            content: row.content,
        })
        .collect())
}

pub async fn append_messages(
    user_id: &str,
    messages: &[ChatMessage],
    pool: &PgPool,
) -> Result<(), sqlx::Error> {
    for message in messages {
        sqlx::query(
            r#"
            insert into chat_message
                (user_id, role, content)
            values
                ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(role_to_str(message.role))
        .bind(&message.content)
        .execute(pool)
        .await?;
    }

    Ok(())
}
