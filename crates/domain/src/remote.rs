//! Remote exchange vocabulary — request methods, event keys, outbound requests.
//!
//! The wire protocol belongs to the transport adapter. The engine only
//! needs to name an endpoint, a method, and a payload for outbound
//! requests, and a `(event name, method)` pair to match inbound events.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Request method shared by the CoAP and HTTP families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method {0:?}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

/// The logical identity of an inbound remote event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    /// Logical event name, e.g. `"cancel alarm"`.
    pub name: String,
    pub method: Method,
}

impl EventKey {
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method) -> Self {
        Self {
            name: name.into(),
            method,
        }
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.method, self.name)
    }
}

/// A one-way outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub uri: String,
    pub method: Method,
    #[serde(default)]
    pub payload: String,
}

impl std::fmt::Display for RemoteRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_methods_case_insensitively() {
        assert_eq!("put".parse::<Method>().unwrap(), Method::Put);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
    }

    #[test]
    fn should_reject_unknown_method() {
        let err = "PATCH".parse::<Method>().unwrap_err();
        assert_eq!(err, UnsupportedMethod("PATCH".to_string()));
    }

    #[test]
    fn should_serialize_method_in_upper_case() {
        let json = serde_json::to_string(&Method::Put).unwrap();
        assert_eq!(json, "\"PUT\"");
    }

    #[test]
    fn should_distinguish_keys_by_method() {
        let put = EventKey::new("cancel alarm", Method::Put);
        let post = EventKey::new("cancel alarm", Method::Post);
        assert_ne!(put, post);
        assert_eq!(put.to_string(), "PUT \"cancel alarm\"");
    }
}
