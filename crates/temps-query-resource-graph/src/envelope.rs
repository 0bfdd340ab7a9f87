//! Resource Graph error envelopes
//!
//! Failed requests usually answer with
//!
//! ```json
//! {"error": {"code": "BadRequest", "message": "...", "details": [...]}}
//! ```
//!
//! but the shape is not guaranteed. Decoding never fails: a body that does not
//! fit the envelope is kept verbatim and rendered as-is.

use serde::Deserialize;
use tracing::warn;

/// Top-level error object of a failed request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    /// Absent and `null` both mean no details
    #[serde(default)]
    pub details: Option<Vec<ErrorDetail>>,
}

/// One entry of `error.details`. Parser failures add a position, plain
/// validation errors only carry code and message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub line: Option<u64>,
    pub character_position_in_line: Option<u64>,
    pub token: Option<String>,
}

impl ErrorDetail {
    fn render(&self) -> String {
        let token = self.token.as_deref().unwrap_or_default();
        match (self.line, self.character_position_in_line) {
            (Some(line), Some(pos)) => {
                format!("{}: line {}, pos {}, \"{}\"", self.code, line, pos, token)
            }
            (Some(line), None) => format!("{}: line {}, \"{}\"", self.code, line, token),
            (None, _) => self.message.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorEnvelope,
}

/// Outcome of decoding an error body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedError {
    Envelope(ErrorEnvelope),
    /// Body that did not match the envelope, kept verbatim
    Raw(String),
}

impl DecodedError {
    /// Decode `body`. Anything that is not `{"error": {"code", "message", ...}}`
    /// becomes [`DecodedError::Raw`].
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => DecodedError::Envelope(parsed.error),
            Err(e) => {
                warn!("Unexpected Resource Graph error body ({}), reporting it raw", e);
                DecodedError::Raw(body.to_string())
            }
        }
    }

    /// Render the diagnostic shown to the user for a response with `status`
    /// (e.g. `400 Bad Request`).
    pub fn render(&self, status: &str) -> String {
        match self {
            DecodedError::Envelope(envelope) => {
                let mut lines = vec![
                    format!("request failed, status: {}", status),
                    format!("{}: {}", envelope.code, envelope.message),
                ];
                match envelope.details.as_deref() {
                    Some(details) if !details.is_empty() => {
                        lines.push("Details:".to_string());
                        lines.extend(details.iter().map(ErrorDetail::render));
                    }
                    _ => {}
                }
                lines.join("\n")
            }
            DecodedError::Raw(body) => {
                format!("request failed, status: {}, body: {}", status, body)
            }
        }
    }
}

/// Decode and render in one step
pub fn format_error(status: &str, body: &str) -> String {
    DecodedError::decode(body).render(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "400 Bad Request";

    #[test]
    fn test_short_error() {
        let body = r#"{
            "error":{
               "code":"BadRequest",
               "message":"Please provide below info when asking for support: timestamp = 2022-01-17T15:50:07.9782199Z, correlationId = 7ba435e5-6371-458f-a1b5-1c7ffdba6ff4.",
               "details":[
                  {
                     "code":"InvalidQuery",
                     "message":"Query is invalid. Please refer to the documentation for the Azure Resource Graph service and fix the error before retrying."
                  },
                  {
                     "code":"UnknownFunction",
                     "message":"Unknown function: 'cout'."
                  }
               ]
            }
         }"#;
        let expected = "request failed, status: 400 Bad Request
BadRequest: Please provide below info when asking for support: timestamp = 2022-01-17T15:50:07.9782199Z, correlationId = 7ba435e5-6371-458f-a1b5-1c7ffdba6ff4.
Details:
Query is invalid. Please refer to the documentation for the Azure Resource Graph service and fix the error before retrying.
Unknown function: 'cout'.";

        assert_eq!(format_error(STATUS, body), expected);
    }

    #[test]
    fn test_error_with_lines() {
        let body = r#"{
            "error":
            {
                "code": "BadRequest",
                "message": "Please provide below info when asking for support: timestamp = 2021-06-04T05:09:13.1870573Z, correlationId = f1c5d97f-26db-4bdc-b023-1f0a862004db.",
                "details":
                [
                    {
                        "code": "InvalidQuery",
                        "message": "Query is invalid. Please refer to the documentation for the Azure Resource Graph service and fix the error before retrying."
                    },
                    {
                        "code": "ParserFailure",
                        "message": "ParserFailure",
                        "line": 2,
                        "token": "<"
                    },
                    {
                        "code": "ParserFailure",
                        "message": "ParserFailure",
                        "line": 4,
                        "characterPositionInLine": 23,
                        "token": "<"
                    }
                ]
            }
        }"#;
        let expected = r#"request failed, status: 400 Bad Request
BadRequest: Please provide below info when asking for support: timestamp = 2021-06-04T05:09:13.1870573Z, correlationId = f1c5d97f-26db-4bdc-b023-1f0a862004db.
Details:
Query is invalid. Please refer to the documentation for the Azure Resource Graph service and fix the error before retrying.
ParserFailure: line 2, "<"
ParserFailure: line 4, pos 23, "<""#;

        assert_eq!(format_error(STATUS, body), expected);
    }

    #[test]
    fn test_error_without_details() {
        let body = r#"{"error": {"code": "AuthorizationFailed", "message": "no access"}}"#;
        assert_eq!(
            format_error("403 Forbidden", body),
            "request failed, status: 403 Forbidden\nAuthorizationFailed: no access"
        );
    }

    #[test]
    fn test_null_or_empty_details_render_without_details() {
        let null_details = r#"{"error": {"code": "BadRequest", "message": "bad", "details": null}}"#;
        assert!(matches!(
            DecodedError::decode(null_details),
            DecodedError::Envelope(ErrorEnvelope { details: None, .. })
        ));
        assert_eq!(
            format_error(STATUS, null_details),
            "request failed, status: 400 Bad Request\nBadRequest: bad"
        );

        let empty_details = r#"{"error": {"code": "BadRequest", "message": "bad", "details": []}}"#;
        assert_eq!(
            format_error(STATUS, empty_details),
            "request failed, status: 400 Bad Request\nBadRequest: bad"
        );
    }

    #[test]
    fn test_error_of_wrong_type_falls_back_to_body() {
        let body = r#"{
            "error":"I m an expected field but of wrong type ! "
        }"#;
        let decoded = DecodedError::decode(body);
        assert_eq!(decoded, DecodedError::Raw(body.to_string()));
        assert_eq!(
            decoded.render(STATUS),
            format!("request failed, status: 400 Bad Request, body: {}", body)
        );
    }

    #[test]
    fn test_unknown_shape_falls_back_to_body() {
        let body = r#"{
            "myerror":"I m completly unexpected and you won't know how to parse me ! ",
            "code":"boom"
        }"#;
        assert_eq!(
            format_error(STATUS, body),
            format!("request failed, status: 400 Bad Request, body: {}", body)
        );
    }

    #[test]
    fn test_non_json_and_empty_bodies_fall_back() {
        assert_eq!(
            format_error("502 Bad Gateway", "<html>gateway</html>"),
            "request failed, status: 502 Bad Gateway, body: <html>gateway</html>"
        );
        assert_eq!(
            format_error("500 Internal Server Error", ""),
            "request failed, status: 500 Internal Server Error, body: "
        );
        let missing_message = r#"{"error": {"code": "X"}}"#;
        assert!(matches!(
            DecodedError::decode(missing_message),
            DecodedError::Raw(_)
        ));
    }

    #[test]
    fn test_position_without_line_renders_message() {
        let detail = ErrorDetail {
            code: "ParserFailure".to_string(),
            message: "odd".to_string(),
            line: None,
            character_position_in_line: Some(3),
            token: Some("x".to_string()),
        };
        assert_eq!(detail.render(), "odd");
    }
}
