use crate::error::{GatewayError, GatewayResult};
use crate::error_translation::ErrorTranslator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The uniform response body every action answers with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_init: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_force: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Envelope {
    /// Success carrying a human-readable message
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            ..Self::default()
        }
    }

    /// Success carrying structured data
    pub fn data<T: Serialize>(data: T) -> GatewayResult<Self> {
        Ok(Self {
            success: true,
            data: Some(serde_json::to_value(data)?),
            ..Self::default()
        })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_fetch_error(mut self, fetch_error: impl Into<String>) -> Self {
        self.fetch_error = Some(fetch_error.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

impl From<GatewayError> for Envelope {
    fn from(error: GatewayError) -> Self {
        let mut envelope = Envelope::failure(error.to_string());
        envelope.hint = ErrorTranslator::translate(&error);

        match error {
            GatewayError::NeedsInit => envelope.needs_init = Some(true),
            GatewayError::CheckoutFailed { needs_force, .. } => {
                envelope.needs_force = Some(needs_force)
            }
            GatewayError::Aborted { transcript, .. } => envelope.output = Some(transcript),
            _ => {}
        }

        envelope
    }
}
