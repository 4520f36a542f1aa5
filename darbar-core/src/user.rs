use chrono::{DateTime, Utc};
use darbar_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::session::Role;
use crate::FieldError;

/// Profile document stored under `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Masked<String>,
    #[serde(default)]
    pub phone_number: Masked<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub gold_member: bool,
    #[serde(default)]
    pub rewards: u64,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// A fresh customer profile: role `user`, not gold, no points.
    pub fn new_customer(registration: &Registration, now: DateTime<Utc>) -> Self {
        let first_name = registration.first_name.trim().to_string();
        let last_name = registration.last_name.trim().to_string();
        Self {
            full_name: full_name(&first_name, &last_name),
            first_name,
            last_name,
            email: Masked::new(registration.email.to_lowercase()),
            phone_number: Masked::new(registration.phone_number.clone()),
            address: registration.address.trim().to_string(),
            role: Role::User,
            gold_member: false,
            rewards: 0,
            email_verified: false,
            image: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    /// Profile for an identity that signed in without one on record.
    pub fn from_identity(email: &str, display_name: Option<&str>, now: DateTime<Utc>) -> Self {
        let display_name = display_name.unwrap_or_default().trim();
        let (first_name, last_name) = match display_name.split_once(' ') {
            Some((first, last)) => (first.to_string(), last.trim().to_string()),
            None => (display_name.to_string(), String::new()),
        };
        Self {
            full_name: display_name.to_string(),
            first_name,
            last_name,
            email: Masked::new(email.to_lowercase()),
            phone_number: Masked::default(),
            address: String::new(),
            role: Role::User,
            gold_member: false,
            rewards: 0,
            email_verified: false,
            image: None,
            created_at: now,
            updated_at: now,
            last_login: Some(now),
        }
    }
}

fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub image: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
            && self.image.is_none()
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(first) = &self.first_name {
            check_name(&mut errors, "firstName", "First name", first);
        }
        if let Some(last) = &self.last_name {
            check_name(&mut errors, "lastName", "Last name", last);
        }
        if let Some(phone) = &self.phone_number {
            if !is_valid_phone(phone) {
                errors.push(FieldError::new("phoneNumber", PHONE_MESSAGE));
            }
        }
        if let Some(address) = &self.address {
            if address.trim().chars().count() < 10 {
                errors.push(FieldError::new("address", ADDRESS_MESSAGE));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn apply(self, profile: &mut UserProfile, now: DateTime<Utc>) {
        if let Some(first) = self.first_name {
            profile.first_name = first.trim().to_string();
        }
        if let Some(last) = self.last_name {
            profile.last_name = last.trim().to_string();
        }
        if let Some(phone) = self.phone_number {
            profile.phone_number = Masked::new(phone);
        }
        if let Some(address) = self.address {
            profile.address = address.trim().to_string();
        }
        if let Some(image) = self.image {
            profile.image = Some(image);
        }
        profile.full_name = full_name(&profile.first_name, &profile.last_name);
        profile.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
}

const PHONE_MESSAGE: &str = "Valid phone number is required (10-15 digits)";
const ADDRESS_MESSAGE: &str = "Valid address is required (minimum 10 characters)";
const PASSWORD_MESSAGE: &str = "Password must be at least 8 characters with uppercase, lowercase, and number";

fn check_name(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str) {
    if value.trim().chars().count() < 2 {
        errors.push(FieldError::new(field, &format!("{} must be at least 2 characters", label)));
    }
}

impl Registration {
    /// Every failing field is reported, not just the first.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_name(&mut errors, "firstName", "First name", &self.first_name);
        check_name(&mut errors, "lastName", "Last name", &self.last_name);
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Valid email is required"));
        }
        if !is_valid_password(&self.password) {
            errors.push(FieldError::new("password", PASSWORD_MESSAGE));
        }
        if !is_valid_phone(&self.phone_number) {
            errors.push(FieldError::new("phoneNumber", PHONE_MESSAGE));
        }
        if self.address.trim().chars().count() < 10 {
            errors.push(FieldError::new("address", ADDRESS_MESSAGE));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn display_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// 10 to 15 digits once formatting characters are stripped.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    (10..=15).contains(&digits)
}
