pub mod domain;
pub mod domain_api_key;
pub mod email_event;
pub mod email_suppression;
pub mod email_template;
pub mod email_template_variable;
pub mod email_tracking_link;
pub mod email_tracking_open;
pub mod user;
pub mod user_billing;
