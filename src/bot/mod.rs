pub mod command;
pub mod handler;
pub mod telegram;
pub mod tracker;
