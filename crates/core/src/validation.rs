//! Form validation rules.
//!
//! Every validator is pure and synchronous. A failure carries all of the
//! rules that did not hold, in a fixed order, so views can itemize them.

use core::fmt;

use thiserror::Error;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Form fields that can be required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Password,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
        })
    }
}

/// A single failed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    /// A required field was left empty.
    #[error("{0} is required")]
    Missing(FormField),
    /// Password has no uppercase letter.
    #[error("password needs an uppercase letter")]
    NoUppercase,
    /// Password has no lowercase letter.
    #[error("password needs a lowercase letter")]
    NoLowercase,
    /// Password is shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    TooShort,
}

/// Validation failure listing every violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_violations(.violations))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// The violated rules, in check order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether `violation` is among the failures.
    #[must_use]
    pub fn contains(&self, violation: Violation) -> bool {
        self.violations.contains(&violation)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turns collected violations into a result.
fn finish(violations: Vec<Violation>) -> Result<(), ValidationError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

fn require(value: &str, field: FormField, violations: &mut Vec<Violation>) {
    if value.is_empty() {
        violations.push(Violation::Missing(field));
    }
}

/// Outcome of each password-strength predicate.
///
/// `Display` renders the itemized summary shown on signup, e.g.
/// `Uppercase: false, Lowercase: true, Length >=6: true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct PasswordStrength {
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub long_enough: bool,
}

impl PasswordStrength {
    /// Evaluate the three predicates for `password`.
    ///
    /// Letters are ASCII `A-Z` / `a-z`; length counts characters, not bytes.
    #[must_use]
    pub fn of(password: &str) -> Self {
        Self {
            has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            long_enough: password.chars().count() >= MIN_PASSWORD_LENGTH,
        }
    }

    /// All three predicates hold.
    #[must_use]
    pub const fn is_strong(&self) -> bool {
        self.has_uppercase && self.has_lowercase && self.long_enough
    }

    fn violations(self) -> impl Iterator<Item = Violation> {
        [
            (!self.has_uppercase).then_some(Violation::NoUppercase),
            (!self.has_lowercase).then_some(Violation::NoLowercase),
            (!self.long_enough).then_some(Violation::TooShort),
        ]
        .into_iter()
        .flatten()
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uppercase: {}, Lowercase: {}, Length >={MIN_PASSWORD_LENGTH}: {}",
            self.has_uppercase, self.has_lowercase, self.long_enough
        )
    }
}

/// Login form: email and password must both be non-empty.
///
/// # Errors
///
/// Returns the missing fields.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    require(email, FormField::Email, &mut violations);
    require(password, FormField::Password, &mut violations);
    finish(violations)
}

/// Signup password rule: uppercase, lowercase and minimum length.
///
/// # Errors
///
/// Returns each failed predicate.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    finish(PasswordStrength::of(password).violations().collect())
}

/// Signup form: email present and a strong password.
///
/// # Errors
///
/// Returns a missing email followed by each failed password predicate.
pub fn validate_signup(email: &str, password: &str) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    require(email, FormField::Email, &mut violations);
    violations.extend(PasswordStrength::of(password).violations());
    finish(violations)
}

/// Booking form: name and email must both be non-empty.
///
/// # Errors
///
/// Returns the missing fields.
pub fn validate_booking(name: &str, email: &str) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    require(name, FormField::Name, &mut violations);
    require(email, FormField::Email, &mut violations);
    finish(violations)
}

/// Password reset form: email must be non-empty.
///
/// # Errors
///
/// Returns [`Violation::Missing`] for the email.
pub fn validate_reset_email(email: &str) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    require(email, FormField::Email, &mut violations);
    finish(violations)
}
