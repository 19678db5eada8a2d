use serde::{Deserialize, Serialize};
use std::fmt;

/// Account details used by the credentialed login and sign-up flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub secret: Secret,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Secret {
    Password(String),
    MobileNumber(String),
}

impl Credentials {
    pub fn with_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: Secret::Password(password.into()),
        }
    }

    pub fn with_mobile_number(email: impl Into<String>, mobile: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: Secret::MobileNumber(mobile.into()),
        }
    }

    pub fn password(&self) -> Option<&str> {
        match &self.secret {
            Secret::Password(password) => Some(password),
            Secret::MobileNumber(_) => None,
        }
    }

    pub fn mobile_number(&self) -> Option<&str> {
        match &self.secret {
            Secret::MobileNumber(mobile) => Some(mobile),
            Secret::Password(_) => None,
        }
    }
}

// Keep secrets out of logs.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Password(_) => f.write_str("Password(***)"),
            Secret::MobileNumber(_) => f.write_str("MobileNumber(***)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secret() {
        let credentials = Credentials::with_password("qa@example.com", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("qa@example.com"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn accessors_match_secret_kind() {
        let login = Credentials::with_password("a@b.c", "pw");
        assert_eq!(login.password(), Some("pw"));
        assert_eq!(login.mobile_number(), None);

        let signup = Credentials::with_mobile_number("a@b.c", "5550100");
        assert_eq!(signup.mobile_number(), Some("5550100"));
        assert_eq!(signup.password(), None);
    }
}
