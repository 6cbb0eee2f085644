use crate::config::OpenMode;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Messages a page sends to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    RegisterOrigin { origin: String },
    OpenLinks(OpenLinksRequest),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterOrigin { .. } => "REGISTER_ORIGIN",
            Self::OpenLinks(_) => "OPEN_LINKS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLinksRequest {
    pub links: Vec<String>,
    #[serde(default)]
    pub open_mode: OpenMode,
    #[serde(default = "default_request_max_tabs")]
    pub max_tabs: u32,
}

fn default_request_max_tabs() -> u32 {
    10
}

/// Replies carry no tag; the field sets tell them apart, so both outcome
/// types reject fields they do not own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Opened(OpenLinksOutcome),
    Registration(RegistrationOutcome),
}

/// Why an origin could not be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegisterReason {
    InvalidOrigin,
    UserDenied,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RegisterReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<String>>,
}

impl RegistrationOutcome {
    pub fn granted(origins: Vec<String>) -> Self {
        Self {
            success: true,
            reason: None,
            origins: Some(origins),
        }
    }

    pub fn refused(reason: RegisterReason) -> Self {
        Self {
            success: false,
            reason: Some(reason),
            origins: None,
        }
    }

    pub fn into_result(self) -> Result<Vec<String>, RegisterReason> {
        if self.success {
            Ok(self.origins.unwrap_or_default())
        } else {
            Err(self.reason.unwrap_or(RegisterReason::Unknown))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenLinksOutcome {
    pub success: bool,
    pub count: usize,
}
