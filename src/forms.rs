//! Form payloads and their validation.
//!
//! Every form field deserializes as a plain string (missing fields become
//! empty) so that absent input is reported as a field error instead of
//! failing extraction.

use std::{ops::Deref, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::products::Category;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const INVALID_CSRF: &str = "The form expired or was tampered with, please try again.";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("static regex"));

/// Field-level validation failures, in the order they were found.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn new() -> FieldErrors {
        FieldErrors::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|(f, _)| *f == field)
    }

    pub fn into_result<T>(self, valid: T) -> Result<T, FieldErrors> {
        if self.0.is_empty() { Ok(valid) } else { Err(self) }
    }
}

impl Deref for FieldErrors {
    type Target = [(&'static str, String)];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Folds a CSRF check into a validation result.
pub fn with_csrf<T>(result: Result<T, FieldErrors>, csrf_ok: bool) -> Result<T, FieldErrors> {
    match (result, csrf_ok) {
        (Ok(valid), true) => Ok(valid),
        (Ok(_), false) => {
            let mut errors = FieldErrors::new();
            errors.push("csrf_token", INVALID_CSRF);
            Err(errors)
        }
        (Err(mut errors), csrf_ok) => {
            if !csrf_ok {
                errors.push("csrf_token", INVALID_CSRF);
            }
            Err(errors)
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_length(errors: &mut FieldErrors, field: &'static str, value: &str, min: usize, max: Option<usize>) {
    let len = value.chars().count();
    match max {
        Some(max) if len < min || len > max => {
            errors.push(field, format!("Field must be between {min} and {max} characters long."))
        }
        None if len < min => {
            errors.push(field, format!("Field must be at least {min} characters long."))
        }
        _ => {}
    }
}

/// Trimmed username, 4 to 80 characters.
pub fn check_username(errors: &mut FieldErrors, raw: &str) -> String {
    let username = raw.trim();
    if username.is_empty() {
        errors.push("username", REQUIRED);
    } else {
        check_length(errors, "username", username, 4, Some(80));
    }
    username.to_owned()
}

/// Normalized email of a plausible shape.
pub fn check_email(errors: &mut FieldErrors, raw: &str) -> String {
    let email = normalize_email(raw);
    if email.is_empty() {
        errors.push("email", REQUIRED);
    } else if !is_valid_email(&email) {
        errors.push("email", INVALID_EMAIL);
    }
    email
}

pub fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.push("password", REQUIRED);
    } else {
        check_length(errors, "password", password, 6, None);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = check_username(&mut errors, &self.username);
        let email = check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);

        errors.into_result(Registration {
            username,
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.push("password", REQUIRED);
        }

        errors.into_result(Credentials {
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub title: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProductInput {
    pub title: String,
    pub category: Category,
    pub description: String,
    pub price: Decimal,
}

impl ProductForm {
    pub fn validate(&self) -> Result<NewProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", REQUIRED);
        }

        let category = match Category::from_str(self.category.trim()) {
            Ok(category) => Some(category),
            Err(_) if self.category.trim().is_empty() => {
                errors.push("category", REQUIRED);
                None
            }
            Err(_) => {
                errors.push("category", "Not a valid choice.");
                None
            }
        };

        let description = self.description.trim();
        if description.is_empty() {
            errors.push("description", REQUIRED);
        }

        let price = match parse_price(&self.price) {
            Ok(price) => Some(price),
            Err(message) => {
                errors.push("price", message);
                None
            }
        };

        match (category, price) {
            (Some(category), Some(price)) => errors.into_result(NewProductInput {
                title: title.to_owned(),
                category,
                description: description.to_owned(),
                price,
            }),
            _ => Err(errors),
        }
    }
}

/// Positive decimal, rounded to cents.
pub fn parse_price(raw: &str) -> Result<Decimal, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(REQUIRED);
    }
    let price = Decimal::from_str(raw).map_err(|_| "Not a valid decimal value.")?;
    normalize_price(price)
}

pub fn normalize_price(price: Decimal) -> Result<Decimal, &'static str> {
    let rounded = price.round_dp(2).normalize();
    if rounded <= Decimal::ZERO {
        return Err("Price must be greater than zero.");
    }
    Ok(rounded)
}
