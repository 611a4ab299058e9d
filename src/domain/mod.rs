pub mod contact;
pub mod lead;
