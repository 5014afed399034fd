//! Checks for path names that arrive from outside the process

use std::path::{Component, Path};

/// A bare file name: exactly one normal component and no separators
pub fn is_plain_file_name(name: &str) -> bool {
    if name.contains(&['/', '\\'][..]) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("motivational_1.mp4"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name("../secret.mp4"));
        assert!(!is_plain_file_name("a/b.mp4"));
        assert!(!is_plain_file_name("a\\b.mp4"));
        assert!(!is_plain_file_name("/etc/passwd"));
        assert!(!is_plain_file_name(""));
    }
}
