pub mod chat_route;
pub mod default_route;
pub mod lead_route;
pub mod train_route;
