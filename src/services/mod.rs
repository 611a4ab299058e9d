pub mod groq_client;
pub mod lead_extractor;
pub mod lead_pipeline;
pub mod lead_scorer;
pub mod response_parser;
pub mod scrape_client;
pub mod search_client;

pub use groq_client::*;
pub use lead_extractor::*;
pub use lead_pipeline::*;
pub use lead_scorer::*;
pub use response_parser::*;
pub use scrape_client::*;
pub use search_client::*;
