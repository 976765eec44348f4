//! Authenticated principal as yielded by the auth gate.

use serde::Serialize;
pub use shared::Role;

/// Caller identity and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Who may use the direct (per-student) check-in path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInPolicy {
    /// Anyone, authenticated or not.
    #[default]
    Open,
    /// Any authenticated principal.
    Authenticated,
    /// Administrators only.
    Admin,
}

impl CheckInPolicy {
    /// Whether `principal` may use a path governed by this policy.
    pub fn permits(self, principal: Option<&Principal>) -> bool {
        match self {
            CheckInPolicy::Open => true,
            CheckInPolicy::Authenticated => principal.is_some(),
            CheckInPolicy::Admin => principal.is_some_and(Principal::is_admin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_permits() {
        let admin = Principal::new("a@campus.test", Role::Admin);
        let student = Principal::new("s@campus.test", Role::Student);

        assert!(CheckInPolicy::Open.permits(None));
        assert!(!CheckInPolicy::Authenticated.permits(None));
        assert!(CheckInPolicy::Authenticated.permits(Some(&student)));
        assert!(!CheckInPolicy::Admin.permits(Some(&student)));
        assert!(CheckInPolicy::Admin.permits(Some(&admin)));
    }

    #[test]
    fn test_policy_deserialize() {
        let policy: CheckInPolicy = serde_json::from_str("\"authenticated\"").unwrap();
        assert_eq!(policy, CheckInPolicy::Authenticated);
        assert_eq!(CheckInPolicy::default(), CheckInPolicy::Open);
    }
}
