pub mod aligo;
pub mod router;

pub use aligo::AligoClient;
pub use router::send_smart_notification;
