pub mod canonical;
pub mod header;
pub mod text;
