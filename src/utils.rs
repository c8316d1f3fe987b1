use unicode_segmentation::UnicodeSegmentation;

/// Truncates a string to `max_width` grapheme clusters, replacing the tail
/// with an ellipsis (`…`) when it is cut.
///
/// Used to keep response bodies from bloating log lines.
///
/// # Panics
/// Panics if `max_width` is less than 2.
///
/// # Examples
/// ```rust
/// use sitenotify::utils::truncate_message;
///
/// assert_eq!(truncate_message("Hello World", 6), "Hello…");
/// assert_eq!(truncate_message("Hi", 5), "Hi");
/// ```
pub fn truncate_message(message: &str, max_width: usize) -> String {
    assert!(
        max_width >= 2,
        "max_width must be at least 2 to accommodate the ellipsis"
    );

    let graphemes: Vec<&str> = message.graphemes(true).collect();

    if graphemes.len() > max_width {
        format!("{}…", graphemes[..max_width - 1].concat())
    } else {
        message.to_string()
    }
}

/// Validates a basic HTTP authentication string in the format `username:password`.
///
/// # Example
///
/// ```rust
/// use sitenotify::utils::validate_basic_auth;
///
/// assert!(validate_basic_auth("user:pass").is_ok());
/// assert!(validate_basic_auth("invalid_format").is_err());
/// ```
pub fn validate_basic_auth(val: &str) -> Result<String, String> {
    match val.split_once(':') {
        Some((user, password)) if !user.is_empty() && !password.is_empty() => Ok(val.to_string()),
        Some(_) => Err(String::from(
            "Invalid format: must be `username:password` with non-empty values",
        )),
        None => Err(String::from("Invalid format: must be `username:password`")),
    }
}
