//! Casing conversions. Both are idempotent: converting a converted name
//! gives the same name back.

/// `my_value` / `myValue` / `_myValue` to `MyValue`. Leading acronyms are
/// kept (`IOStream` stays). `None` when no identifier can be formed.
pub fn to_pascal(name: &str) -> Option<String> {
    let joined = join_words(name)?;
    let mut chars = joined.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// `MyValue` / `my_value` / `_myValue` to `myValue`. A leading acronym is
/// lowered as a whole (`IOStream` to `ioStream`, `URL` to `url`).
pub fn to_camel(name: &str) -> Option<String> {
    let joined = join_words(name)?;
    let chars: Vec<char> = joined.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lower = match upper_run {
        0 => 0,
        n if n == chars.len() => n,
        1 => 1,
        // the last capital starts the next word
        n if chars[n].is_lowercase() => n - 1,
        n => n,
    };
    Some(
        chars
            .iter()
            .enumerate()
            .flat_map(|(i, c)| {
                let lowered: Vec<char> = if i < lower {
                    c.to_lowercase().collect()
                } else {
                    vec![*c]
                };
                lowered
            })
            .collect(),
    )
}

/// Drop underscores, capitalising the word after each inner one.
fn join_words(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    for (i, word) in name.split('_').filter(|w| !w.is_empty()).enumerate() {
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        if i == 0 {
            out.push(first);
        } else {
            out.extend(first.to_uppercase());
        }
        out.extend(chars);
    }
    let first = out.chars().next()?;
    if !first.is_alphabetic() {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal("count").as_deref(), Some("Count"));
        assert_eq!(to_pascal("my_value").as_deref(), Some("MyValue"));
        assert_eq!(to_pascal("_name").as_deref(), Some("Name"));
        assert_eq!(to_pascal("IOStream").as_deref(), Some("IOStream"));
        assert_eq!(to_pascal("MAX_SIZE").as_deref(), Some("MAXSIZE"));
        assert_eq!(to_pascal("_"), None);
        assert_eq!(to_pascal("_1st"), None);
    }

    #[test]
    fn camel_case() {
        assert_eq!(to_camel("Count").as_deref(), Some("count"));
        assert_eq!(to_camel("IOStream").as_deref(), Some("ioStream"));
        assert_eq!(to_camel("URL").as_deref(), Some("url"));
        assert_eq!(to_camel("my_value").as_deref(), Some("myValue"));
        assert_eq!(to_camel("_cache").as_deref(), Some("cache"));
        assert_eq!(to_camel("xCoord").as_deref(), Some("xCoord"));
        assert_eq!(to_camel("__"), None);
    }

    proptest! {
        #[test]
        fn pascal_is_idempotent(name in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
            if let Some(once) = to_pascal(&name) {
                prop_assert_eq!(to_pascal(&once), Some(once.clone()));
            }
        }

        #[test]
        fn camel_is_idempotent(name in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
            if let Some(once) = to_camel(&name) {
                prop_assert_eq!(to_camel(&once), Some(once.clone()));
            }
        }
    }
}
