//! Real-time notification of job outcomes.

pub mod channel;
pub mod dispatcher;

pub use channel::{DeliveryError, RealtimeChannel, RealtimeMessage, UserChannelHub};
pub use dispatcher::{
    event_name, Notification, NotificationDispatcher, EVENT_JOB_COMPLETED, EVENT_JOB_FAILED,
};
