// Case Conversion - Kebab-case keys from raw media params

/// Split `input` into words
///
/// Non-alphanumeric characters separate words, and so do digit/letter
/// boundaries, lower→upper transitions (`minWidth`) and the end of an
/// acronym followed by a capitalized word (`HTMLParser`).
pub fn split_words(input: &str) -> Vec<String> {
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

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let boundary = prev.is_alphanumeric()
                && ((prev.is_numeric() != c.is_numeric())
                    || (prev.is_lowercase() && c.is_uppercase())
                    || (prev.is_uppercase()
                        && c.is_uppercase()
                        && next.is_some_and(|n| n.is_lowercase())));
            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Lowercase, hyphen-separated form of `input`
///
/// `"screen and (min-width: 1024px)"` becomes
/// `"screen-and-min-width-1024-px"`.
pub fn kebab_case(input: &str) -> String {
    split_words(input)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
