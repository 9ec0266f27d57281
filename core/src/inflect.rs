//! Identifier inflection
//!
//! Pure helpers used when substituting real identifiers into remediation
//! examples:
//!
//! - [`camelize`]: `first_name` → `FirstName`
//! - [`singularize`]: `user_accounts` → `user_account` (last word only)
//! - [`classify`]: `public.user_accounts` → `UserAccount`
//!
//! Singularization covers the common English plural forms plus a short list of
//! irregular and uncountable nouns. Words that already look singular (ending
//! in `ss`, `us` or `is`, or not ending in `s` at all) are returned unchanged.

/// Nouns whose singular and plural forms are the same
const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "metadata",
    "money",
    "news",
    "series",
    "sheep",
    "species",
];

/// Irregular plural → singular pairs
const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
];

/// Suffix rules, checked in order; first match wins
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("statuses", "status"),
    ("aliases", "alias"),
    ("buses", "bus"),
    ("movies", "movie"),
    ("quizzes", "quiz"),
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("xes", "x"),
    ("zzes", "zz"),
    ("ies", "y"),
    ("lves", "lf"),
    ("rves", "rf"),
    ("tives", "tive"),
    ("hives", "hive"),
    ("ives", "ife"),
];

/// Convert a snake_case identifier to UpperCamelCase.
///
/// Empty segments (leading, trailing or doubled underscores) are dropped and
/// the rest of each segment is kept as-is, so `HTTP_status` → `HTTPStatus`.
pub fn camelize(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Singularize the last word of a snake_case identifier
pub fn singularize(identifier: &str) -> String {
    match identifier.rfind('_') {
        Some(pos) => format!(
            "{}{}",
            &identifier[..=pos],
            singularize_word(&identifier[pos + 1..])
        ),
        None => singularize_word(identifier),
    }
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_lowercase();

    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return keep_leading_case(word, singular);
    }

    for (suffix, replacement) in SUFFIX_RULES {
        if lower.ends_with(suffix) {
            // Suffixes are ASCII, so byte offsets line up with `word`
            let stem = &word[..word.len() - suffix.len()];
            return format!("{}{}", stem, replacement);
        }
    }

    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }

    match word.strip_suffix('s').or_else(|| word.strip_suffix('S')) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

fn keep_leading_case(original: &str, replacement: &str) -> String {
    let upper = original.chars().next().is_some_and(char::is_uppercase);
    if upper {
        camelize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Model name for a table: drops any schema prefix, singularizes, camelizes
pub fn classify(table: &str) -> String {
    let bare = table.rsplit('.').next().unwrap_or(table);
    camelize(&singularize(bare))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("users"), "Users");
        assert_eq!(camelize("first_name"), "FirstName");
        assert_eq!(camelize("user_account_settings"), "UserAccountSettings");
        assert_eq!(camelize("_leading__double_"), "LeadingDouble");
        assert_eq!(camelize("HTTP_status"), "HTTPStatus");
        assert_eq!(camelize(""), "");
    }

    #[test]
    fn test_singularize_regular() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("batches"), "batch");
        assert_eq!(singularize("wishes"), "wish");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("wolves"), "wolf");
        assert_eq!(singularize("wives"), "wife");
        assert_eq!(singularize("objectives"), "objective");
    }

    #[test]
    fn test_singularize_already_singular() {
        assert_eq!(singularize("user"), "user");
        assert_eq!(singularize("address"), "address");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("analysis"), "analysis");
        assert_eq!(singularize("s"), "s");
    }

    #[test]
    fn test_singularize_irregular_and_uncountable() {
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("children"), "child");
        assert_eq!(singularize("news"), "news");
        assert_eq!(singularize("metadata"), "metadata");
    }

    #[test]
    fn test_singularize_multi_word() {
        assert_eq!(singularize("user_accounts"), "user_account");
        assert_eq!(singularize("news_categories"), "news_category");
        assert_eq!(singularize("admin_people"), "admin_person");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("users"), "User");
        assert_eq!(classify("user_accounts"), "UserAccount");
        assert_eq!(classify("public.line_items"), "LineItem");
        assert_eq!(classify("people"), "Person");
        assert_eq!(classify("user"), "User");
    }
}
