//! Identifier case conversions exposed to templates as filters.

/// Split an identifier into lowercase words.
///
/// Boundaries are non-alphanumeric characters, a lower-to-upper change
/// (`userId`), and the end of an uppercase run (`HTTPServer` -> `http`, `server`).
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn snake_case(value: String) -> String {
    words(&value).join("_")
}

pub fn kebab_case(value: String) -> String {
    words(&value).join("-")
}

pub fn screaming_snake_case(value: String) -> String {
    snake_case(value).to_uppercase()
}

pub fn pascal_case(value: String) -> String {
    words(&value).iter().map(|w| capitalize(w)).collect()
}

pub fn camel_case(value: String) -> String {
    let pascal = pascal_case(value);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_common_shapes() {
        assert_eq!(words("user_handler"), vec!["user", "handler"]);
        assert_eq!(words("UserHandler"), vec!["user", "handler"]);
        assert_eq!(words("userId"), vec!["user", "id"]);
        assert_eq!(words("HTTPServer"), vec!["http", "server"]);
        assert_eq!(words("order-item v2"), vec!["order", "item", "v2"]);
    }

    #[test]
    fn converts_between_cases() {
        assert_eq!(snake_case("UserHandler".into()), "user_handler");
        assert_eq!(pascal_case("user_handler".into()), "UserHandler");
        assert_eq!(camel_case("user-handler".into()), "userHandler");
        assert_eq!(screaming_snake_case("maxRetries".into()), "MAX_RETRIES");
        assert_eq!(kebab_case("UserHandler".into()), "user-handler");
        assert_eq!(snake_case(String::new()), "");
    }
}
