//! Credential gate in front of the filesystem.
//!
//! The core has no notion of users; a deployment checks every request here
//! first and only then calls into [`DavFs`](textdav_vfs::DavFs).

use std::collections::BTreeMap;

/// Result of checking a request's credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthOutcome {
    Granted,
    /// No credentials supplied while some are required.
    Missing,
    Rejected,
}

impl AuthOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthOutcome::Granted)
    }

    /// HTTP status for a refused request.
    pub fn http_code(&self) -> u16 {
        match self {
            AuthOutcome::Granted => 200,
            AuthOutcome::Missing | AuthOutcome::Rejected => 401,
        }
    }
}

/// Basic user/password table. An empty table admits everyone.
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    realm: String,
    users: BTreeMap<String, String>,
}

impl CredentialGate {
    pub fn new(realm: impl Into<String>, users: BTreeMap<String, String>) -> Self {
        Self {
            realm: realm.into(),
            users,
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// True when no users are configured.
    pub fn is_open(&self) -> bool {
        self.users.is_empty()
    }

    pub fn check(&self, user: Option<&str>, password: Option<&str>) -> AuthOutcome {
        if self.is_open() {
            return AuthOutcome::Granted;
        }
        let Some(user) = user else {
            tracing::debug!(realm = %self.realm, "credentials missing");
            return AuthOutcome::Missing;
        };
        match self.users.get(user) {
            Some(expected) if Some(expected.as_str()) == password => {
                tracing::debug!(user, "credentials accepted");
                AuthOutcome::Granted
            }
            _ => {
                tracing::warn!(user, realm = %self.realm, "credentials rejected");
                AuthOutcome::Rejected
            }
        }
    }

    /// `WWW-Authenticate` challenge for refused requests.
    pub fn challenge(&self) -> String {
        format!("Basic realm=\"{}\"", self.realm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CredentialGate {
        let mut users = BTreeMap::new();
        users.insert("alice".to_string(), "secret".to_string());
        CredentialGate::new("media", users)
    }

    #[test]
    fn test_empty_table_is_anonymous() {
        let open = CredentialGate::new("x", BTreeMap::new());
        assert!(open.is_open());
        assert_eq!(open.check(None, None), AuthOutcome::Granted);
        assert_eq!(open.check(Some("anyone"), Some("x")), AuthOutcome::Granted);
    }

    #[test]
    fn test_check() {
        let gate = gate();
        assert_eq!(gate.check(Some("alice"), Some("secret")), AuthOutcome::Granted);
        assert_eq!(gate.check(Some("alice"), Some("nope")), AuthOutcome::Rejected);
        assert_eq!(gate.check(Some("alice"), None), AuthOutcome::Rejected);
        assert_eq!(gate.check(Some("bob"), Some("secret")), AuthOutcome::Rejected);
        assert_eq!(gate.check(None, None), AuthOutcome::Missing);
        assert_eq!(AuthOutcome::Missing.http_code(), 401);
        assert_eq!(AuthOutcome::Rejected.to_string(), "rejected");
    }

    #[test]
    fn test_challenge() {
        assert_eq!(gate().challenge(), "Basic realm=\"media\"");
    }
}
