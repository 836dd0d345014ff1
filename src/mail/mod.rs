pub mod email_html;
pub mod sender;
pub mod subscribers;
pub mod transport;
