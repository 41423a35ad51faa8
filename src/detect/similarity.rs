//! Name similarity ratio used as the configurable matching escape hatch.

/// Levenshtein edit distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

/// Case-insensitive similarity in `0.0..=1.0`; `1.0` means equal.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(&a, &b) as f64 / longest as f64
}

/// Whether one lower-cased name contains the other.
pub fn names_related(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity_ratio("Email", "email"), 1.0);
        assert!((similarity_ratio("UserName", "Username") - 1.0).abs() < f64::EPSILON);
        assert!(similarity_ratio("EmailAddr", "EmailAddress") > 0.7);
        assert!(similarity_ratio("Email", "Phone") < 0.5);
        assert_eq!(similarity_ratio("", ""), 1.0);
    }

    #[test]
    fn test_names_related() {
        assert!(names_related("User", "UserDTO"));
        assert!(names_related("ProductResponse", "product"));
        assert!(names_related("Apple", "Pineapple"));
        assert!(!names_related("Order", "Invoice"));
    }
}
