pub mod dirs;
pub mod ui;
