//! API token handling for the `authorize` call.

use serde_json::Value;
use zeroize::Zeroizing;

use super::types::{self, AuthorizeInfo};
use crate::error::BrokerError;
use crate::types::Account;

/// An API token, wiped from memory on drop.
pub type Token = Zeroizing<String>;

/// Show only the last four characters of a token, for logs.
pub fn redact(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".into();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// `{"authorize": <token>, "req_id": <id>}`, built without a `Value` so the
/// only copies of the secret are zeroized ones.
pub fn authorize_request(token: &str, req_id: u64) -> Result<Zeroizing<String>, BrokerError> {
    let quoted = Zeroizing::new(
        serde_json::to_string(token).map_err(|e| BrokerError::Auth(format!("bad token: {e}")))?,
    );
    Ok(Zeroizing::new(format!(
        "{{\"authorize\":{},\"req_id\":{req_id}}}",
        quoted.as_str()
    )))
}

/// Read the account out of an `authorize` response.
///
/// Token rejections come back as `InvalidToken`/`AuthorizationRequired`
/// errors and are reported as [`BrokerError::Auth`].
pub fn parse_authorize(response: Value) -> Result<Account, BrokerError> {
    let response = types::check(response).map_err(|e| match e {
        BrokerError::Api { code, message } => BrokerError::Auth(format!("{code}: {message}")),
        other => other,
    })?;
    let info: AuthorizeInfo = types::payload(&response, "authorize")?;
    Ok(info.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redact_keeps_tail() {
        assert_eq!(redact("a1b2c3d4e5"), "****d4e5");
        assert_eq!(redact("abc"), "****");
        assert_eq!(redact(""), "****");
    }

    #[test]
    fn authorize_payload() {
        let payload = authorize_request("secret\"token", 7).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["authorize"], "secret\"token");
        assert_eq!(value["req_id"], 7);
    }

    #[test]
    fn parse_account() {
        let response = json!({
            "msg_type": "authorize",
            "authorize": {
                "loginid": "VRTC1234567",
                "currency": "USD",
                "balance": 10000.0,
                "is_virtual": 1
            }
        });
        let account = parse_authorize(response).unwrap();
        assert_eq!(account.loginid, "VRTC1234567");
        assert!(account.is_virtual);
        assert_eq!(account.kind(), "demo");
    }

    #[test]
    fn rejected_token_is_auth_error() {
        let response = json!({
            "msg_type": "authorize",
            "error": {"code": "InvalidToken", "message": "The token is invalid."}
        });
        match parse_authorize(response) {
            Err(BrokerError::Auth(msg)) => assert!(msg.starts_with("InvalidToken")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
