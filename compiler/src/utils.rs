use crate::error::KiwiError;

/// JSON-style quoting used in every diagnostic that names user text.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: usize, column: usize) -> KiwiError {
    KiwiError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// Converts a string to PascalCase.
/// - With underscores: each word gets an uppercase first letter, the rest lowercase.
/// - Fully uppercase without underscores ("SIGNAL"): only the first letter stays uppercase.
/// - Otherwise only the first letter is changed.
pub fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| capitalize(word, true))
            .collect()
    } else {
        capitalize(s, s == s.to_uppercase())
    }
}

/// Converts a string to snake_case without splitting acronyms
/// ("sessionID" becomes "session_id").
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if prev != '_' && (!prev.is_uppercase() || (i + 1 < chars.len() && chars[i + 1].is_lowercase())) {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Lower camelCase, used for TypeScript members.
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().to_string() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_conversions() {
        assert_eq!(to_pascal_case("hello_world"), "HelloWorld");
        assert_eq!(to_pascal_case("SIGNAL"), "Signal");
        assert_eq!(to_pascal_case("clientID"), "ClientID");
        assert_eq!(to_snake_case("sessionID"), "session_id");
        assert_eq!(to_snake_case("clientID"), "client_id");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_camel_case("say_hello"), "sayHello");
        assert_eq!(to_camel_case("SayHello"), "sayHello");
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
