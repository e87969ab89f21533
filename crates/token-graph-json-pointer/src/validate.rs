//! Checks applied to `$ref` targets before they are followed.

use crate::JsonPointerError;

/// A decoded fragment pointer is empty (the whole document) or starts
/// with `/`.
///
/// ```
/// use token_graph_json_pointer::validate_json_pointer;
///
/// validate_json_pointer("").unwrap();
/// validate_json_pointer("/colors/0").unwrap();
/// validate_json_pointer("colors").unwrap_err();
/// ```
pub fn validate_json_pointer(pointer: &str) -> Result<(), JsonPointerError> {
    if pointer.is_empty() || pointer.starts_with('/') {
        Ok(())
    } else {
        Err(JsonPointerError::PointerInvalid(pointer.to_string()))
    }
}

/// Reads an array step. Only canonical indices count: digits with no
/// leading zero, so `#/c/components/01` never aliases `#/c/components/1`.
pub(crate) fn array_index(step: &str) -> Result<usize, JsonPointerError> {
    let canonical = !step.is_empty()
        && step.bytes().all(|b| b.is_ascii_digit())
        && (step.len() == 1 || !step.starts_with('0'));
    if !canonical {
        return Err(JsonPointerError::InvalidIndex(step.to_string()));
    }
    step.parse().map_err(|_| JsonPointerError::InvalidIndex(step.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_needs_leading_slash() {
        assert_eq!(
            validate_json_pointer("a/b"),
            Err(JsonPointerError::PointerInvalid("a/b".into()))
        );
    }

    #[test]
    fn array_steps_are_canonical() {
        assert_eq!(array_index("0"), Ok(0));
        assert_eq!(array_index("12"), Ok(12));
        assert!(array_index("01").is_err());
        assert!(array_index("-1").is_err());
        assert!(array_index("").is_err());
        assert!(array_index("99999999999999999999999").is_err());
    }
}
