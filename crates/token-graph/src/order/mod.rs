//! Fractional ordering keys.
//!
//! Keys are base-62 strings made of a variable-length integer part (its
//! length is encoded by the head character: `a`..`z` are 2..27 characters
//! long, `A`..`Z` are 27..2 characters long) followed by an optional
//! fraction without trailing zeros. Plain byte-wise string comparison orders
//! them, so siblings can be inserted anywhere without renumbering.
//!
//! ```
//! use token_graph::order::key_between;
//!
//! let first = key_between(None, None).unwrap();
//! assert_eq!(first, "a0");
//! let next = key_between(Some(&first), None).unwrap();
//! let mid = key_between(Some(&first), Some(&next)).unwrap();
//! assert!(first < mid && mid < next);
//! ```

use thiserror::Error;

/// Digit alphabet in ascending byte order.
pub const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: usize = 62;

/// The key returned for an empty sibling list.
pub const FIRST_KEY: &str = "a0";

/// Integer part below which no key can be generated.
const SMALLEST_INTEGER: &str = "A00000000000000000000000000";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    #[error("invalid order key `{0}`")]
    InvalidKey(String),
    #[error("order key `{lower}` is not below `{upper}`")]
    OutOfOrder { lower: String, upper: String },
    #[error("order key space exhausted")]
    Exhausted,
}

fn digit(c: u8) -> usize {
    DIGITS.iter().position(|&d| d == c).unwrap_or(0)
}

fn integer_length(head: u8) -> Option<usize> {
    match head {
        b'a'..=b'z' => Some((head - b'a') as usize + 2),
        b'A'..=b'Z' => Some((b'Z' - head) as usize + 2),
        _ => None,
    }
}

fn integer_part(key: &str) -> Result<&str, OrderKeyError> {
    let invalid = || OrderKeyError::InvalidKey(key.to_string());
    let head = *key.as_bytes().first().ok_or_else(invalid)?;
    let len = integer_length(head).ok_or_else(invalid)?;
    key.get(..len).ok_or_else(invalid)
}

/// Check that `key` could have been produced by this module.
pub fn validate_key(key: &str) -> Result<(), OrderKeyError> {
    if key == SMALLEST_INTEGER || !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(OrderKeyError::InvalidKey(key.to_string()));
    }
    let int = integer_part(key)?;
    if key[int.len()..].ends_with('0') {
        return Err(OrderKeyError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Digits strictly between fractions `a` and `b` (`None` = no upper bound).
///
/// Requires `a < b` and neither ending in `0`.
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        // Skip the shared prefix, padding `a` with zeros.
        let mut n = 0;
        while n < b.len() && a.get(n).copied().unwrap_or(b'0') == b[n] {
            n += 1;
        }
        if n > 0 {
            let mut out = b[..n].to_vec();
            out.extend(midpoint(a.get(n..).unwrap_or(&[]), Some(&b[n..])));
            return out;
        }
    }
    let digit_a = a.first().map(|&c| digit(c)).unwrap_or(0);
    let digit_b = b.and_then(|b| b.first()).map(|&c| digit(c)).unwrap_or(BASE);
    if digit_b > digit_a + 1 {
        return vec![DIGITS[(digit_a + digit_b + 1) / 2]];
    }
    match b {
        Some(b) if b.len() > 1 => vec![b[0]],
        _ => {
            let mut out = vec![DIGITS[digit_a]];
            out.extend(midpoint(a.get(1..).unwrap_or(&[]), None));
            out
        }
    }
}

fn increment_integer(int: &str) -> Option<String> {
    let bytes = int.as_bytes();
    let head = bytes[0];
    let mut digits = bytes[1..].to_vec();
    let mut carry = true;
    for d in digits.iter_mut().rev() {
        let next = digit(*d) + 1;
        if next == BASE {
            *d = DIGITS[0];
        } else {
            *d = DIGITS[next];
            carry = false;
            break;
        }
    }
    if carry {
        match head {
            b'Z' => return Some("a0".to_string()),
            b'z' => return None,
            _ => {}
        }
        let head = head + 1;
        if head > b'a' {
            digits.push(DIGITS[0]);
        } else {
            digits.pop();
        }
        return Some(assemble(head, &digits));
    }
    Some(assemble(head, &digits))
}

fn decrement_integer(int: &str) -> Option<String> {
    let bytes = int.as_bytes();
    let head = bytes[0];
    let mut digits = bytes[1..].to_vec();
    let mut borrow = true;
    for d in digits.iter_mut().rev() {
        let idx = digit(*d);
        if idx == 0 {
            *d = DIGITS[BASE - 1];
        } else {
            *d = DIGITS[idx - 1];
            borrow = false;
            break;
        }
    }
    if borrow {
        match head {
            b'a' => return Some(assemble(b'Z', &[DIGITS[BASE - 1]])),
            b'A' => return None,
            _ => {}
        }
        let head = head - 1;
        if head < b'Z' {
            digits.push(DIGITS[BASE - 1]);
        } else {
            digits.pop();
        }
        return Some(assemble(head, &digits));
    }
    Some(assemble(head, &digits))
}

fn assemble(head: u8, digits: &[u8]) -> String {
    let mut out = String::with_capacity(digits.len() + 1);
    out.push(head as char);
    out.extend(digits.iter().map(|&d| d as char));
    out
}

fn join(int: &str, frac: Vec<u8>) -> String {
    let mut out = String::with_capacity(int.len() + frac.len());
    out.push_str(int);
    out.extend(frac.into_iter().map(char::from));
    out
}

/// Returns a key strictly between `lower` and `upper`.
///
/// `None` leaves that side open. Both bounds must be valid keys and
/// `lower < upper`.
pub fn key_between(lower: Option<&str>, upper: Option<&str>) -> Result<String, OrderKeyError> {
    if let Some(a) = lower {
        validate_key(a)?;
    }
    if let Some(b) = upper {
        validate_key(b)?;
    }
    match (lower, upper) {
        (None, None) => Ok(FIRST_KEY.to_string()),
        (Some(a), Some(b)) if a >= b => Err(OrderKeyError::OutOfOrder {
            lower: a.to_string(),
            upper: b.to_string(),
        }),
        (None, Some(b)) => {
            let ib = integer_part(b)?;
            let fb = &b[ib.len()..];
            if ib == SMALLEST_INTEGER {
                return Ok(join(ib, midpoint(&[], Some(fb.as_bytes()))));
            }
            if ib.len() < b.len() {
                return Ok(ib.to_string());
            }
            decrement_integer(ib).ok_or(OrderKeyError::Exhausted)
        }
        (Some(a), None) => {
            let ia = integer_part(a)?;
            let fa = &a[ia.len()..];
            Ok(match increment_integer(ia) {
                Some(next) => next,
                None => join(ia, midpoint(fa.as_bytes(), None)),
            })
        }
        (Some(a), Some(b)) => {
            let ia = integer_part(a)?;
            let fa = &a[ia.len()..];
            let ib = integer_part(b)?;
            let fb = &b[ib.len()..];
            if ia == ib {
                return Ok(join(ia, midpoint(fa.as_bytes(), Some(fb.as_bytes()))));
            }
            let next = increment_integer(ia).ok_or(OrderKeyError::Exhausted)?;
            if next.as_str() < b {
                Ok(next)
            } else {
                Ok(join(ia, midpoint(fa.as_bytes(), None)))
            }
        }
    }
}

/// Returns `n` sorted keys strictly between `lower` and `upper`.
///
/// Bisects the interval so the keys stay short when both bounds are set.
pub fn n_keys_between(
    lower: Option<&str>,
    upper: Option<&str>,
    n: usize,
) -> Result<Vec<String>, OrderKeyError> {
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![key_between(lower, upper)?]),
        _ => {}
    }
    match (lower, upper) {
        (_, None) => {
            let mut keys = Vec::with_capacity(n);
            let mut last = key_between(lower, None)?;
            for _ in 1..n {
                let next = key_between(Some(&last), None)?;
                keys.push(std::mem::replace(&mut last, next));
            }
            keys.push(last);
            Ok(keys)
        }
        (None, Some(_)) => {
            let mut keys = Vec::with_capacity(n);
            let mut first = key_between(None, upper)?;
            for _ in 1..n {
                let prev = key_between(None, Some(&first))?;
                keys.push(std::mem::replace(&mut first, prev));
            }
            keys.push(first);
            keys.reverse();
            Ok(keys)
        }
        (Some(_), Some(_)) => {
            let mid = n / 2;
            let pivot = key_between(lower, upper)?;
            let mut keys = n_keys_between(lower, Some(&pivot), mid)?;
            let tail = n_keys_between(Some(&pivot), upper, n - mid - 1)?;
            keys.push(pivot);
            keys.extend(tail);
            Ok(keys)
        }
    }
}
