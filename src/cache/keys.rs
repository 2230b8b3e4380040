//! Key Adapters
//!
//! Stock functions turning application keys into index strings.

use std::fmt::Display;

use serde::Serialize;

use crate::error::BoxError;

/// Uses the key's `Display` rendering.
pub fn display<K: Display + ?Sized>(key: &K) -> Result<String, BoxError> {
    Ok(key.to_string())
}

/// Uses the key's compact JSON rendering, for composite keys.
pub fn json<K: Serialize + ?Sized>(key: &K) -> Result<String, BoxError> {
    serde_json::to_string(key).map_err(BoxError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_key() {
        assert_eq!(display(&42).unwrap(), "42");
        assert_eq!(display("abc").unwrap(), "abc");
    }

    #[test]
    fn test_json_key_distinguishes_structure() {
        assert_eq!(json(&("a", 1)).unwrap(), r#"["a",1]"#);
        assert_ne!(json(&("1", 2)).unwrap(), json(&(1, "2")).unwrap());
    }
}
