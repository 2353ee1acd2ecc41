//! Shared utility functions

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Page state stays usable after a panicking callback; the guard's
/// contents are plain data without invariants spanning the panic.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Last path segment of a type name, e.g. `SettingsMenu` for `demo::SettingsMenu`.
///
/// Generic arguments are kept as-is.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Truncate a string to at most `max_chars` characters.
///
/// Hosts count label limits in characters, not bytes, so this never splits
/// a code point.
///
/// # Examples
///
/// ```
/// use pagetree::util::truncate_chars;
///
/// assert_eq!(truncate_chars("hello world", 5), "hello");
/// assert_eq!(truncate_chars("日本語", 2), "日本");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        pub struct Widget;
        pub struct Wrapper<T>(#[allow(dead_code)] T);
    }

    #[test]
    fn test_truncate_shorter_than_max() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        let s = "日本語";
        assert_eq!(truncate_chars(s, 1), "日");
        assert_eq!(truncate_chars(s, 3), "日本語");
    }

    #[test]
    fn test_truncate_empty_string() {
        assert_eq!(truncate_chars("", 5), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_short_type_name_strips_path() {
        assert_eq!(short_type_name::<nested::Widget>(), "Widget");
    }

    #[test]
    fn test_short_type_name_keeps_generics() {
        let name = short_type_name::<nested::Wrapper<nested::Widget>>();
        assert!(name.starts_with("Wrapper<"), "got {name}");
    }
}
