pub mod check;
pub mod editor_config;
pub mod robots;
pub mod serve;
