pub mod json;
pub mod panel;
pub mod table;
