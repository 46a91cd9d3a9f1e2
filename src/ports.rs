pub mod channel;
pub mod push;
pub mod store;

pub use channel::TemplateChannel;
pub use push::PushSender;
pub use store::{SubscriptionStore, UserDirectory};
