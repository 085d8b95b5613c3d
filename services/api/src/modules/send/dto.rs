use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

/// `variables` arrives either as a JSON object or as a raw string holding a
/// JSON object (invalid JSON in the string form is treated as empty, not an
/// error — see `into_map`).
#[derive(Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Variables {
    Object(HashMap<String, String>),
    Raw(String),
}

impl Variables {
    pub fn into_map(self) -> HashMap<String, String> {
        match self {
            Variables::Object(map) => map,
            Variables::Raw(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        }
    }
}

/// Accepts either a single recipient or a list; normalized by `into_list`.
#[derive(Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    pub fn into_list(self) -> Vec<String> {
        match self {
            Recipients::One(addr) => vec![addr],
            Recipients::Many(addrs) => addrs,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct SendRequest {
    #[validate(length(min = 1, message = "from is required"))]
    pub from: String,

    pub to: Recipients,

    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub template_id: Option<String>,
    pub variables: Option<Variables>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    pub reply_to: Option<String>,

    #[serde(default)]
    pub disable_tracking: bool,
}

#[derive(Serialize, ToSchema)]
pub struct SendResponse {
    pub success: bool,
    pub job_id: String,
    pub message_id: String,
    pub recipients: usize,
    pub suppressed: usize,
    pub status: &'static str,
}
