pub mod app;
pub mod download;
pub mod version;
pub mod worker;
