pub mod token;
pub mod token_context;
pub mod token_store;
