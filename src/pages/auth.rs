use tracing::debug;

use super::Effect;
use crate::dispatch::{Request, Response};
use crate::widgets::TextField;

fn error_text(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[derive(Debug)]
pub struct LoginPage {
    pub email: TextField,
    pub password: TextField,
    pub focus: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self {
            email: TextField::new("Email Address"),
            password: TextField::masked("Password"),
            focus: 0,
            error: None,
            submitting: false,
        }
    }
}

impl LoginPage {
    pub fn focused_mut(&mut self) -> &mut TextField {
        if self.focus == 0 { &mut self.email } else { &mut self.password }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % 2;
    }

    pub fn submit(&mut self) -> Option<Effect> {
        if self.submitting {
            return None;
        }
        if self.email.is_blank() || self.password.text().is_empty() {
            self.error = Some("Email and password are required".to_string());
            return None;
        }
        self.submitting = true;
        self.error = None;
        debug!("submitting login");
        Some(Effect::Request(Request::Login {
            email: self.email.text().trim().to_string(),
            password: self.password.text().to_string(),
        }))
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        let Response::Authenticated(result) = response else {
            return Vec::new();
        };
        self.submitting = false;
        match result {
            Ok(session) => {
                self.password.clear();
                vec![Effect::SignedIn(session)]
            }
            Err(err) => {
                self.error = Some(error_text(err.message, "Login failed"));
                Vec::new()
            }
        }
    }
}

#[derive(Debug)]
pub struct RegisterPage {
    pub email: TextField,
    pub password: TextField,
    pub confirm: TextField,
    pub focus: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for RegisterPage {
    fn default() -> Self {
        Self {
            email: TextField::new("Email Address"),
            password: TextField::masked("Password"),
            confirm: TextField::masked("Confirm Password"),
            focus: 0,
            error: None,
            submitting: false,
        }
    }
}

impl RegisterPage {
    pub fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            0 => &mut self.email,
            1 => &mut self.password,
            _ => &mut self.confirm,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % 3;
    }

    pub fn submit(&mut self) -> Option<Effect> {
        if self.submitting {
            return None;
        }
        if self.email.is_blank() || self.password.text().is_empty() {
            self.error = Some("Email and password are required".to_string());
            return None;
        }
        if self.password.text() != self.confirm.text() {
            self.error = Some("Passwords do not match".to_string());
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some(Effect::Request(Request::Register {
            email: self.email.text().trim().to_string(),
            password: self.password.text().to_string(),
        }))
    }

    pub fn apply(&mut self, response: Response) -> Vec<Effect> {
        let Response::Authenticated(result) = response else {
            return Vec::new();
        };
        self.submitting = false;
        match result {
            Ok(session) => {
                self.password.clear();
                self.confirm.clear();
                vec![Effect::SignedIn(session)]
            }
            Err(err) => {
                self.error = Some(error_text(err.message, "Registration failed"));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ErrorKind};
    use crate::models::Session;

    fn fill(field: &mut TextField, value: &str) {
        field.value = value.to_string();
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut page = LoginPage::default();
        fill(&mut page.email, "a@b.com");
        assert_eq!(page.submit(), None);
        assert!(page.error.is_some());
        assert!(!page.submitting);
    }

    #[test]
    fn test_login_submits_once_while_in_flight() {
        let mut page = LoginPage::default();
        fill(&mut page.email, " a@b.com ");
        fill(&mut page.password, "secret");

        let first = page.submit();
        assert_eq!(
            first,
            Some(Effect::Request(Request::Login {
                email: "a@b.com".to_string(),
                password: "secret".to_string(),
            }))
        );
        assert_eq!(page.submit(), None);
    }

    #[test]
    fn test_login_success_signs_in() {
        let mut page = LoginPage::default();
        fill(&mut page.email, "a@b.com");
        fill(&mut page.password, "secret");
        page.submit();

        let session = Session {
            id: 7,
            email: "a@b.com".to_string(),
        };
        let effects = page.apply(Response::Authenticated(Ok(session.clone())));
        assert_eq!(effects, vec![Effect::SignedIn(session)]);
        assert!(!page.submitting);
        assert!(page.password.text().is_empty());
    }

    #[test]
    fn test_login_failure_shows_inline_error() {
        let mut page = LoginPage::default();
        fill(&mut page.email, "a@b.com");
        fill(&mut page.password, "wrong");
        page.submit();

        let effects = page.apply(Response::Authenticated(Err(ApiError::new(
            ErrorKind::Unauthorized,
            "Invalid email or password",
        ))));
        assert!(effects.is_empty());
        assert_eq!(page.error.as_deref(), Some("Invalid email or password"));

        // Retry is possible after a failure.
        assert!(page.submit().is_some());
    }

    #[test]
    fn test_login_failure_without_message_uses_default() {
        let mut page = LoginPage::default();
        page.apply(Response::Authenticated(Err(ApiError::new(ErrorKind::Server, ""))));
        assert_eq!(page.error.as_deref(), Some("Login failed"));
    }

    #[test]
    fn test_register_rejects_mismatched_passwords() {
        let mut page = RegisterPage::default();
        fill(&mut page.email, "a@b.com");
        fill(&mut page.password, "secret");
        fill(&mut page.confirm, "secreT");
        assert_eq!(page.submit(), None);
        assert_eq!(page.error.as_deref(), Some("Passwords do not match"));
    }

    #[test]
    fn test_register_success_signs_in() {
        let mut page = RegisterPage::default();
        fill(&mut page.email, "a@b.com");
        fill(&mut page.password, "secret");
        fill(&mut page.confirm, "secret");
        assert!(matches!(page.submit(), Some(Effect::Request(Request::Register { .. }))));

        let effects = page.apply(Response::Authenticated(Ok(Session {
            id: 3,
            email: "a@b.com".to_string(),
        })));
        assert!(matches!(effects.as_slice(), [Effect::SignedIn(s)] if s.id == 3));
    }

    #[test]
    fn test_focus_cycles() {
        let mut page = RegisterPage::default();
        page.focused_mut().push('x');
        page.next_field();
        page.next_field();
        page.focused_mut().push('y');
        page.next_field();
        assert_eq!(page.focus, 0);
        assert_eq!(page.email.text(), "x");
        assert_eq!(page.confirm.text(), "y");
    }
}
