//! Generated identifiers.

use uuid::Uuid;

/// A fresh random token (hyphenated UUID v4), used for follow-up ids.
pub fn new_token() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
