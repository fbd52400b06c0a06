const DROPPED: [char; 9] = ['“', '”', '’', '‘', '…', '"', '\'', '(', ')'];

/// Case and whitespace insensitive form used for approximate matching.
pub fn normalize(text: &str) -> String {
    let mut s = text.to_lowercase();
    s.retain(|c| !DROPPED.contains(&c));

    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Edit distance in chars, or `None` as soon as it must exceed `limit`.
pub fn levenshtein_within(a: &[char], b: &[char], limit: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > limit {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    let mut prev = (0..=b.len()).collect::<Vec<_>>();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ac) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, bc) in b.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }
        // Distances never shrink from one row to the next.
        if row_min > limit {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let d = prev[b.len()];
    (d <= limit).then_some(d)
}

/// Largest distance still considered the same text, from the char counts
/// of both sides: a tenth of the longer one, so anything under ten chars
/// must normalize identically.
pub fn tolerance(a_len: usize, b_len: usize) -> usize {
    a_len.max(b_len) / 10
}
