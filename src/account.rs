//! User accounts that log in by email.
//!
//! Storage, email uniqueness and soft-delete cascades belong to the
//! persistence layer. This module keeps the rules that live in application
//! code: the username always mirrors the email, deletion only sets a marker,
//! and every change is appended to the account history.

use std::fmt;
use std::time::SystemTime;
use tracing::info;

/// Hook run by the persistence layer right before a record is written.
pub trait PrePersist {
    fn pre_persist(&mut self);
}

/// One entry of an account's change history. Never modified once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub from: Option<String>,
    pub to: Option<String>,
    pub at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    email: String,
    username: String,
    pub first_name: String,
    pub last_name: String,
    deleted_at: Option<SystemTime>,
    history: Vec<FieldChange>,
}

impl Account {
    /// New account whose username starts out equal to its email.
    pub fn new(email: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            email: email.to_string(),
            username: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            deleted_at: None,
            history: Vec::new(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Change the email. The username follows on the next [`PrePersist::pre_persist`].
    pub fn set_email(&mut self, email: &str) {
        if email != self.email {
            let old = std::mem::replace(&mut self.email, email.to_string());
            self.record("email", Some(old), Some(email.to_string()));
        }
    }

    /// Set the username directly. Anything other than the email is undone
    /// by [`PrePersist::pre_persist`].
    pub fn set_username(&mut self, username: &str) {
        self.username = username.to_string();
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn deleted_at(&self) -> Option<SystemTime> {
        self.deleted_at
    }

    /// Mark the account deleted. Deleting twice keeps the first marker.
    pub fn soft_delete(&mut self, at: SystemTime) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(at);
            self.history.push(FieldChange {
                field: "deleted",
                from: None,
                to: Some(format!("{:?}", at)),
                at,
            });
        }
    }

    /// Clear the deletion marker.
    pub fn restore(&mut self, at: SystemTime) {
        if let Some(prev) = self.deleted_at.take() {
            self.history.push(FieldChange {
                field: "deleted",
                from: Some(format!("{:?}", prev)),
                to: None,
                at,
            });
        }
    }

    pub fn history(&self) -> &[FieldChange] {
        &self.history
    }

    /// "First Last" when both names are set, the email otherwise.
    pub fn name_or_email(&self) -> String {
        if !self.first_name.is_empty() && !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            self.email.clone()
        }
    }

    fn record(&mut self, field: &'static str, from: Option<String>, to: Option<String>) {
        self.history.push(FieldChange {
            field,
            from,
            to,
            at: SystemTime::now(),
        });
    }
}

impl PrePersist for Account {
    fn pre_persist(&mut self) {
        if self.username != self.email {
            info!(
                from = %self.username,
                to = %self.email,
                "account username changed to match email"
            );
            let old = std::mem::replace(&mut self.username, self.email.clone());
            self.record("username", Some(old), Some(self.email.clone()));
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}, {}", self.email, self.last_name, self.first_name)
    }
}
