pub mod error;
pub mod ll1;
pub mod report;
pub mod table;
