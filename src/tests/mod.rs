#[cfg(test)]
pub mod common;

pub mod send_message;
