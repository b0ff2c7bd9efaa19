//! Form state and validation that runs before any network call.

use thiserror::Error;

use crate::models::{FeeLimit, FeeLimitRequest, Role};

/// Maximum length for the email field.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password fields.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the OTP field.
const MAX_OTP_LENGTH: usize = 12;

/// Maximum length for free-text fields (names, phone, file paths).
const MAX_TEXT_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingCredentials,

    #[error("Please enter your email")]
    MissingEmail,

    #[error("OTP and new password are required")]
    MissingResetFields,

    #[error("Both role and amount are required.")]
    MissingLimitFields,

    #[error("Amount must be a positive number.")]
    InvalidAmount,

    #[error("A limit for this role already exists.")]
    DuplicateRole,
}

/// Kind of text a form field holds, for input filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Password,
    Otp,
    Amount,
    Text,
}

impl FieldKind {
    fn max_len(&self) -> usize {
        match self {
            FieldKind::Email => MAX_EMAIL_LENGTH,
            FieldKind::Password => MAX_PASSWORD_LENGTH,
            FieldKind::Otp => MAX_OTP_LENGTH,
            FieldKind::Amount => 12,
            FieldKind::Text => MAX_TEXT_LENGTH,
        }
    }
}

/// Check if a character may be appended to a field of the given kind.
pub fn can_add_char(kind: FieldKind, current_len: usize, c: char) -> bool {
    if current_len >= kind.max_len() || c.is_control() {
        return false;
    }
    match kind {
        FieldKind::Otp => c.is_ascii_alphanumeric(),
        FieldKind::Amount => c.is_ascii_digit() || c == '.',
        FieldKind::Email => !c.is_whitespace(),
        FieldKind::Password | FieldKind::Text => true,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetPasswordForm {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if self.otp.trim().is_empty() || self.new_password.is_empty() {
            return Err(ValidationError::MissingResetFields);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.email.clear();
        self.otp.clear();
        self.new_password.clear();
    }
}

/// Add/edit form for a registration fee or project budget limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeLimitForm {
    pub role: Option<Role>,
    pub amount: String,
    /// Id of the row being edited, if any.
    pub editing_id: Option<String>,
}

impl FeeLimitForm {
    pub fn editing(limit: &FeeLimit) -> Self {
        Self {
            role: Role::parse(&limit.role),
            amount: limit.amount.clone(),
            editing_id: Some(limit.id.clone()),
        }
    }

    pub fn cycle_role(&mut self) {
        self.role = Some(match self.role {
            Some(role) => role.next(),
            None => Role::Writer,
        });
    }

    /// Validate against the rows already listed. When `unique_roles` is set,
    /// a role may appear only once (the row being edited excepted).
    pub fn validate(
        &self,
        existing: &[FeeLimit],
        unique_roles: bool,
    ) -> Result<FeeLimitRequest, ValidationError> {
        let role = match self.role {
            Some(role) if !self.amount.trim().is_empty() => role,
            _ => return Err(ValidationError::MissingLimitFields),
        };

        let amount = self.amount.trim();
        match amount.parse::<f64>() {
            Ok(value) if value > 0.0 && value.is_finite() => {}
            _ => return Err(ValidationError::InvalidAmount),
        }

        if unique_roles {
            let duplicate = existing.iter().any(|l| {
                l.role.eq_ignore_ascii_case(role.as_str())
                    && Some(&l.id) != self.editing_id.as_ref()
            });
            if duplicate {
                return Err(ValidationError::DuplicateRole);
            }
        }

        Ok(FeeLimitRequest {
            role: role.as_str().to_string(),
            amount: amount.to_string(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
