pub mod chat_db;
pub mod lead_db;
