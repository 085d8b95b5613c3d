//! The payload handed from the accept-and-enqueue path to the worker through
//! a [`crate::queue::JobQueue`]. Kept in `shared` so neither side drifts from
//! the other's idea of the wire shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the queue both the API and the worker connect to.
pub const SEND_QUEUE_NAME: &str = "send";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendJobPayload {
    pub job_id: String,
    pub message_id: String,
    pub user_id: String,
    pub domain_id: String,
    pub api_key_id: String,
    pub sending_domain: String,
    pub from_name: Option<String>,
    pub from_address: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub reply_to: Option<String>,
    pub headers: HashMap<String, String>,
}
