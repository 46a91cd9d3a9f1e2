pub mod channel;
pub mod push;
