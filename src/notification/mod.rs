//! Notification delivery: the SMS dispatcher and its Twilio transport.

pub mod dispatcher;
pub mod twilio;

pub use dispatcher::SmsDispatcher;
pub use twilio::{SmsClient, TwilioConfig, TwilioSmsClient};
