//! Entity ID generation and resolution
//!
//! All IDs use the format: `{8-char-hex}-{kind}-{slug}`
//! Example: `3f9a01c2-task-record-intro-video`

/// Generate an entity ID from kind and display name
///
/// The hex prefix comes from the random tail of a UUIDv7, so two entities with
/// the same name minted in the same millisecond still get distinct IDs.
pub fn generate_id(kind: &str, name: &str) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    let hex = &uuid[uuid.len() - 8..];
    let slug = slugify(name);
    if slug.is_empty() {
        format!("{}-{}", hex, kind)
    } else {
        format!("{}-{}-{}", hex, kind, slug)
    }
}

/// Slugify a name for use in IDs (capped at six words)
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .take(6)
        .collect::<Vec<_>>()
        .join("-")
}

/// Resolve a partial ID reference typed by a user (CLI) to a full ID
///
/// Returns:
/// - Ok(Some(id)) if exactly one match (an exact match always wins)
/// - Ok(None) if no matches
/// - Err with candidates if ambiguous
pub fn resolve_id_prefix<'a, I>(ids: I, reference: &str) -> Result<Option<String>, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches = Vec::new();
    for id in ids {
        if id == reference {
            return Ok(Some(id.to_string()));
        }
        if matches_reference(id, reference) {
            matches.push(id.to_string());
        }
    }

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => Err(matches),
    }
}

fn matches_reference(id: &str, reference: &str) -> bool {
    if id.starts_with(reference) {
        return true;
    }

    // Slug contains match (everything after the hex prefix)
    match id.find('-') {
        Some(slug_start) => id[slug_start + 1..].contains(reference),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id("task", "Record Intro Video");
        assert!(id.contains("-task-"));
        assert!(id.ends_with("record-intro-video"));
        assert_eq!(id.find('-'), Some(8));
    }

    #[test]
    fn test_generate_id_unique_for_same_name() {
        let a = generate_id("task", "same");
        let b = generate_id("task", "same");
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_id_without_slug() {
        let id = generate_id("fact", "!!!");
        assert!(id.ends_with("-fact"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("No Excuse 2.0"), "no-excuse-2-0");
        assert_eq!(slugify("here's a test"), "heres-a-test");
        assert_eq!(slugify("one two three four five six seven"), "one-two-three-four-five-six");
    }

    #[test]
    fn test_resolve_id_prefix() {
        let ids = ["0a1b2c3d-task-call-mom", "99ffee00-task-call-dad"];

        assert_eq!(
            resolve_id_prefix(ids.iter().copied(), "0a1b").unwrap(),
            Some("0a1b2c3d-task-call-mom".to_string())
        );
        assert_eq!(
            resolve_id_prefix(ids.iter().copied(), "call-dad").unwrap(),
            Some("99ffee00-task-call-dad".to_string())
        );
        assert_eq!(resolve_id_prefix(ids.iter().copied(), "zzz").unwrap(), None);
        assert_eq!(resolve_id_prefix(ids.iter().copied(), "call").unwrap_err().len(), 2);
    }
}
