use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::lead::LeadRecord;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SavedLeadRow {
    pub id: Uuid,
    pub company: String,
    pub website: Option<String>,
    pub contact: String,
    pub details: String,
    pub industry: Option<String>,
    pub confidence: f32,
}

pub async fn insert_lead(
    lead: &LeadRecord,
    contact: &str,
    pool: &PgPool,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        insert into lead
            (id, company, website, contact, details, industry, confidence)
        values
            ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(&lead.name)
    .bind(&lead.source_url)
    .bind(contact)
    .bind(&lead.details)
    .bind(&lead.industry)
    .bind(lead.confidence)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn get_saved_leads(pool: &PgPool) -> Result<Vec<SavedLeadRow>, sqlx::Error> {
    sqlx::query_as::<_, SavedLeadRow>(
        r#"
        select
            id, company, website, contact, details, industry, confidence
        from
            lead
        order by
            created_at desc
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn delete_lead(id: Uuid, pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        delete from lead where id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
