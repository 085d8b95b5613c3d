/// the `Authorization` header was not present on the request
pub static MISSING_AUTH_HEADER: &str = "MISSING_AUTH_HEADER";

/// the `Authorization` header did not start with the literal `Bearer ` prefix
pub static INVALID_AUTH_FORMAT: &str = "INVALID_AUTH_FORMAT";

/// the bearer token was present but empty after trimming
pub static EMPTY_API_KEY: &str = "EMPTY_API_KEY";

/// no active `domain_api_key` row matches the hashed key
pub static INVALID_API_KEY: &str = "INVALID_API_KEY";

/// the key's domain has not completed TXT verification
pub static DOMAIN_NOT_VERIFIED: &str = "DOMAIN_NOT_VERIFIED";

/// the `from` address does not belong to the authenticated key's domain
pub static FROM_ADDRESS_MISMATCH: &str = "FROM_ADDRESS_MISMATCH";

/// the request body failed validation (missing subject/body, bad email, etc)
pub static VALIDATION_ERROR: &str = "VALIDATION_ERROR";

/// `template_id` did not resolve to an active template owned by the tenant
pub static TEMPLATE_NOT_FOUND: &str = "TEMPLATE_NOT_FOUND";

/// sending would exceed `user_billing.email_limit`
pub static QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";

/// no `email_event` rows exist for the given message id
pub static MESSAGE_NOT_FOUND: &str = "MESSAGE_NOT_FOUND";

/// no `email_suppression` row exists for the given id and tenant
pub static SUPPRESSION_NOT_FOUND: &str = "SUPPRESSION_NOT_FOUND";

/// the suppression reason in the request body is not a recognized value
pub static UNKNOWN_SUPPRESSION_REASON: &str = "UNKNOWN_SUPPRESSION_REASON";

/// a database, queue, or other unexpected backend failure
pub static INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// no `email_tracking_link` row matches the tracking id in a click redirect
pub static TRACKING_LINK_NOT_FOUND: &str = "TRACKING_LINK_NOT_FOUND";
