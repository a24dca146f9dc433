//! Typed provider credentials and the codec that decodes them from the
//! opaque JSON blob stored on each account.
//!
//! Decoding happens once, when a refresh cycle plans its work, so adapters
//! only ever see the typed shape. A missing, `null`, or empty required field
//! is a [`CredentialError::MissingFields`]; nothing is defaulted.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::provider::ProviderType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credentials for {provider_type} must be a JSON object, got {found}")]
    NotAnObject {
        provider_type: ProviderType,
        found: &'static str,
    },

    #[error(
        "credentials for {provider_type} are missing required fields: {}",
        .missing_fields.join(", ")
    )]
    MissingFields {
        provider_type: ProviderType,
        missing_fields: Vec<&'static str>,
    },

    #[error("credentials for {provider_type} are not valid JSON: {reason}")]
    Malformed {
        provider_type: ProviderType,
        reason: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct WhatsAppCredentials {
    pub api_key: String,
    pub waba_id: String,
    pub phone_number_id: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SkypeCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct MessengerCredentials {
    pub access_token: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct HelpScoutCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Decoded credentials, one variant per [`ProviderType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    WhatsApp(WhatsAppCredentials),
    Skype(SkypeCredentials),
    Messenger(MessengerCredentials),
    HelpScout(HelpScoutCredentials),
}

impl Credentials {
    #[must_use]
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Credentials::WhatsApp(_) => ProviderType::WhatsApp,
            Credentials::Skype(_) => ProviderType::Skype,
            Credentials::Messenger(_) => ProviderType::Messenger,
            Credentials::HelpScout(_) => ProviderType::HelpScout,
        }
    }

    /// Decode a stored credential blob for `provider_type`.
    ///
    /// Unknown extra keys are ignored. Integer values are accepted for id-like
    /// fields and converted to their decimal string.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotAnObject`] if `raw` is not a JSON object.
    /// - [`CredentialError::MissingFields`] listing every required key that is
    ///   absent, `null`, empty, or not a string/integer.
    pub fn decode(provider_type: ProviderType, raw: &Value) -> Result<Self, CredentialError> {
        let Value::Object(obj) = raw else {
            return Err(CredentialError::NotAnObject {
                provider_type,
                found: json_kind(raw),
            });
        };

        let mut fields = FieldReader::new(obj);
        let credentials = match provider_type {
            ProviderType::WhatsApp => {
                let api_key = fields.required("api_key");
                let waba_id = fields.required("waba_id");
                let phone_number_id = fields.required("phone_number_id");
                fields.finish(provider_type)?;
                Credentials::WhatsApp(WhatsAppCredentials {
                    api_key,
                    waba_id,
                    phone_number_id,
                })
            }
            ProviderType::Skype => {
                let username = fields.required("username");
                let password = fields.required("password");
                fields.finish(provider_type)?;
                Credentials::Skype(SkypeCredentials { username, password })
            }
            ProviderType::Messenger => {
                let access_token = fields.required("access_token");
                fields.finish(provider_type)?;
                Credentials::Messenger(MessengerCredentials { access_token })
            }
            ProviderType::HelpScout => {
                let client_id = fields.required("client_id");
                let client_secret = fields.required("client_secret");
                fields.finish(provider_type)?;
                Credentials::HelpScout(HelpScoutCredentials {
                    client_id,
                    client_secret,
                })
            }
        };

        Ok(credentials)
    }

    /// Decode credentials stored as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Malformed`] if `raw` is not valid JSON, or
    /// any error from [`Credentials::decode`].
    pub fn decode_str(provider_type: ProviderType, raw: &str) -> Result<Self, CredentialError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| CredentialError::Malformed {
                provider_type,
                reason: e.to_string(),
            })?;
        Self::decode(provider_type, &value)
    }

    /// Encode back into the blob shape [`Credentials::decode`] accepts.
    #[must_use]
    pub fn encode(&self) -> Value {
        match self {
            Credentials::WhatsApp(c) => serde_json::json!({
                "api_key": c.api_key,
                "waba_id": c.waba_id,
                "phone_number_id": c.phone_number_id,
            }),
            Credentials::Skype(c) => serde_json::json!({
                "username": c.username,
                "password": c.password,
            }),
            Credentials::Messenger(c) => serde_json::json!({
                "access_token": c.access_token,
            }),
            Credentials::HelpScout(c) => serde_json::json!({
                "client_id": c.client_id,
                "client_secret": c.client_secret,
            }),
        }
    }
}

/// Collects required string fields and remembers which ones were missing so
/// a single error can list all of them.
struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    missing: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    fn new(obj: &'a Map<String, Value>) -> Self {
        Self {
            obj,
            missing: Vec::new(),
        }
    }

    fn required(&mut self, key: &'static str) -> String {
        let value = match self.obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        };
        value.unwrap_or_else(|| {
            self.missing.push(key);
            String::new()
        })
    }

    fn finish(self, provider_type: ProviderType) -> Result<(), CredentialError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(CredentialError::MissingFields {
                provider_type,
                missing_fields: self.missing,
            })
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Debug for WhatsAppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppCredentials")
            .field("api_key", &"[redacted]")
            .field("waba_id", &self.waba_id)
            .field("phone_number_id", &self.phone_number_id)
            .finish()
    }
}

impl fmt::Debug for SkypeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkypeCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl fmt::Debug for MessengerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessengerCredentials")
            .field("access_token", &"[redacted]")
            .finish()
    }
}

impl fmt::Debug for HelpScoutCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelpScoutCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_whatsapp_credentials() {
        let raw = json!({
            "api_key": "key",
            "waba_id": "waba",
            "phone_number_id": 1_234_567,
        });
        let creds = Credentials::decode(ProviderType::WhatsApp, &raw).expect("decode");
        let Credentials::WhatsApp(c) = creds else {
            panic!("expected WhatsApp credentials, got {creds:?}");
        };
        assert_eq!(c.api_key, "key");
        assert_eq!(c.waba_id, "waba");
        assert_eq!(c.phone_number_id, "1234567");
    }

    #[test]
    fn missing_password_is_reported_not_defaulted() {
        let raw = json!({ "username": "alice" });
        let err = Credentials::decode(ProviderType::Skype, &raw).unwrap_err();
        assert_eq!(
            err,
            CredentialError::MissingFields {
                provider_type: ProviderType::Skype,
                missing_fields: vec!["password"],
            }
        );
    }

    #[test]
    fn empty_and_null_fields_count_as_missing() {
        let raw = json!({ "client_id": "  ", "client_secret": null });
        let err = Credentials::decode(ProviderType::HelpScout, &raw).unwrap_err();
        assert!(
            matches!(
                &err,
                CredentialError::MissingFields { missing_fields, .. }
                    if missing_fields == &vec!["client_id", "client_secret"]
            ),
            "unexpected error: {err:?}"
        );
        assert_eq!(
            err.to_string(),
            "credentials for HelpScout are missing required fields: client_id, client_secret"
        );
    }

    #[test]
    fn non_object_blob_is_rejected() {
        let err = Credentials::decode(ProviderType::Messenger, &json!(["token"])).unwrap_err();
        assert_eq!(
            err,
            CredentialError::NotAnObject {
                provider_type: ProviderType::Messenger,
                found: "array",
            }
        );
    }

    #[test]
    fn decode_str_rejects_invalid_json() {
        let err = Credentials::decode_str(ProviderType::Messenger, "{not json").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let raw = json!({ "access_token": "tok", "page_name": "Shop" });
        let creds = Credentials::decode(ProviderType::Messenger, &raw).expect("decode");
        assert_eq!(creds.provider_type(), ProviderType::Messenger);
    }

    #[test]
    fn encode_output_decodes_to_the_same_credentials() {
        let creds = Credentials::HelpScout(HelpScoutCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        });
        let decoded =
            Credentials::decode(ProviderType::HelpScout, &creds.encode()).expect("decode");
        assert_eq!(decoded, creds);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::Skype(SkypeCredentials {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        });
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
