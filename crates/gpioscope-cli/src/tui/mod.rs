pub mod app;
pub mod layout;
pub mod picker;
pub mod ui;
