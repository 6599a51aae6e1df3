//! Candidate address generation.

/// Company-wide addresses tried when no person pattern is confirmed.
pub const GENERIC_PREFIXES: &[&str] = &[
    "info", "support", "contact", "help", "sales", "team", "hello", "hi", "admin",
];

/// Common corporate patterns for a person, most likely first, deduplicated.
///
/// Names are lowercased and stripped of whitespace. When one of the names is
/// empty only the patterns built from the other one are produced.
pub fn person_patterns(first: &str, last: &str, domain: &str) -> Vec<String> {
    let f = clean_name(first);
    let l = clean_name(last);
    let fi = f.chars().next().map(String::from).unwrap_or_default();
    let li = l.chars().next().map(String::from).unwrap_or_default();

    let locals: Vec<String> = match (f.is_empty(), l.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => vec![f.clone()],
        (true, false) => vec![l.clone()],
        (false, false) => vec![
            f.clone(),
            l.clone(),
            format!("{f}{l}"),
            format!("{f}.{l}"),
            format!("{f}_{l}"),
            format!("{f}-{l}"),
            format!("{fi}{l}"),
            format!("{fi}.{l}"),
            format!("{l}{fi}"),
            format!("{l}.{fi}"),
            format!("{f}{li}"),
            format!("{f}.{li}"),
            format!("{fi}{li}"),
        ],
    };

    let mut out: Vec<String> = Vec::with_capacity(locals.len());
    for local in locals {
        let candidate = format!("{local}@{domain}");
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

pub fn generic_patterns(domain: &str) -> Vec<String> {
    GENERIC_PREFIXES
        .iter()
        .map(|prefix| format!("{prefix}@{domain}"))
        .collect()
}

fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
