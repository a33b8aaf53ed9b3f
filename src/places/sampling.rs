//! Deterministic capping of oversized place lists.
//!
//! Truncating an alphabetical list keeps "Aaaville" and drops "Zurich". Instead
//! we seed the output with the country's popular cities, then deal the rest
//! out of per-letter buckets round-robin until the limit is reached.

use std::collections::{HashSet, VecDeque};

use super::aliases::{canonical_of, normalize};
use super::policy;

/// 26 letters plus `#` for everything else.
const BUCKETS: usize = 27;

/// Shortest popular-city prefix we accept when the input name is the shorter one.
const MIN_REVERSE_PREFIX: usize = 4;

/// Deduplicate (case/diacritic-insensitive) and sort case-insensitively.
/// The first spelling seen for a key is kept.
pub fn dedupe_sorted<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out: Vec<(String, String)> = Vec::new();
    for item in items {
        let item: String = item.into();
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = normalize(trimmed);
        if seen.insert(key.clone()) {
            out.push((key, trimmed.to_string()));
        }
    }
    out.sort();
    out.into_iter().map(|(_, name)| name).collect()
}

/// Cap `items` to `limit` using the popular-city list of `country_name`.
pub fn cap_country(country_name: &str, items: &[String], limit: usize) -> Vec<String> {
    let country = canonical_of(country_name);
    cap_to_limit(policy::popular_cities(&country), items, limit)
}

/// Reduce `items` to at most `limit` entries, keeping popular places and
/// spreading the remainder across starting letters.
pub fn cap_to_limit(popular: &[&str], items: &[String], limit: usize) -> Vec<String> {
    let sorted = dedupe_sorted(items.iter().cloned());
    if sorted.len() <= limit {
        return sorted;
    }

    let keys: Vec<String> = sorted.iter().map(|s| normalize(s)).collect();
    let mut taken = vec![false; sorted.len()];
    let mut seeds: Vec<String> = Vec::new();

    for name in popular {
        match fuzzy_match(name, &keys) {
            Some(i) => {
                if !taken[i] {
                    taken[i] = true;
                    seeds.push(sorted[i].clone());
                }
            }
            None => seeds.push(name.to_string()),
        }
    }
    let mut seeds = dedupe_sorted(seeds);
    if seeds.len() >= limit {
        seeds.truncate(limit);
        return seeds;
    }

    let mut buckets: Vec<VecDeque<&String>> = vec![VecDeque::new(); BUCKETS];
    for (i, name) in sorted.iter().enumerate() {
        if !taken[i] {
            buckets[bucket_index(&keys[i])].push_back(name);
        }
    }

    let mut out = seeds;
    'rounds: loop {
        let mut progressed = false;
        for bucket in buckets.iter_mut() {
            if out.len() >= limit {
                break 'rounds;
            }
            if let Some(name) = bucket.pop_front() {
                out.push(name.clone());
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let mut out = dedupe_sorted(out);
    out.truncate(limit);
    out
}

/// A–Z map to 0–25; anything else goes to the `#` bucket last.
fn bucket_index(key: &str) -> usize {
    match key.chars().next() {
        Some(c) if c.is_ascii_lowercase() => (c as u8 - b'a') as usize,
        _ => BUCKETS - 1,
    }
}

/// Index of the best input entry for a popular name, in order of preference:
/// exact, input starts with popular, popular starts with input, input
/// contains popular. Within a class the first alphabetical entry wins.
fn fuzzy_match(popular: &str, keys: &[String]) -> Option<usize> {
    let p = normalize(popular);
    if p.is_empty() {
        return None;
    }
    keys.iter()
        .position(|k| *k == p)
        .or_else(|| keys.iter().position(|k| k.starts_with(&p)))
        .or_else(|| {
            keys.iter()
                .position(|k| k.chars().count() >= MIN_REVERSE_PREFIX && p.starts_with(k.as_str()))
        })
        .or_else(|| keys.iter().position(|k| k.contains(&p)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(prefixes: &str, per_letter: usize) -> Vec<String> {
        prefixes
            .chars()
            .flat_map(|c| (0..per_letter).map(move |i| format!("{}town {:03}", c, i)))
            .collect()
    }

    fn distinct_letters(items: &[String]) -> usize {
        items
            .iter()
            .filter_map(|s| normalize(s).chars().next())
            .collect::<HashSet<_>>()
            .len()
    }

    #[test]
    fn test_dedupe_sorted_case_and_diacritics() {
        let out = dedupe_sorted(["zürich", "Zurich", "amsterdam", " Bern ", "", "ZÜRICH"]);
        assert_eq!(out, vec!["amsterdam", "Bern", "zürich"]);
    }

    #[test]
    fn test_under_limit_unchanged() {
        let items: Vec<String> = vec!["Oslo".into(), "Bergen".into(), "oslo".into()];
        assert_eq!(cap_to_limit(&[], &items, 10), vec!["Bergen", "Oslo"]);
    }

    #[test]
    fn test_cap_respects_limit() {
        let items = names("ABCDEFGHIJKLMNOPQRSTUVWXYZ", 20);
        for limit in [0, 1, 7, 26, 50, 100, 519] {
            assert!(cap_to_limit(&[], &items, limit).len() <= limit);
        }
        assert_eq!(cap_to_limit(&[], &items, 100).len(), 100);
    }

    #[test]
    fn test_alphabetic_diversity() {
        // Heavily skewed towards A.
        let mut items = names("A", 400);
        items.extend(names("BCDEFGHIJKLMNOPQRSTUVWXYZ", 3));
        let out = cap_to_limit(&[], &items, 100);
        assert_eq!(out.len(), 100);
        assert!(distinct_letters(&out) >= 25);
    }

    #[test]
    fn test_hash_bucket_included() {
        let mut items = names("AB", 50);
        items.push("'s-Hertogenbosch".into());
        items.push("6th of October City".into());
        let out = cap_to_limit(&[], &items, 10);
        assert!(out.contains(&"'s-Hertogenbosch".to_string()));
        assert!(out.contains(&"6th of October City".to_string()));
    }

    #[test]
    fn test_popular_seed_kept() {
        let mut items = names("ABCDEFGHIJKLMNOPQRSTUVWXYZ", 10);
        items.push("Zurich".into());
        let out = cap_to_limit(&["Zürich"], &items, 30);
        assert!(out.contains(&"Zurich".to_string()));
    }

    #[test]
    fn test_popular_injected_when_absent() {
        let items = names("ABCDEFGH", 20);
        let out = cap_to_limit(&["Reykjavík"], &items, 20);
        assert_eq!(out.len(), 20);
        assert!(out.contains(&"Reykjavík".to_string()));
    }

    #[test]
    fn test_popular_prefix_match() {
        let mut items = names("BCD", 30);
        items.push("New York City".into());
        items.push("New Yorker Mills".into());
        let out = cap_to_limit(&["New York"], &items, 5);
        assert!(out.contains(&"New York City".to_string()));
        assert!(!out.contains(&"New York".to_string()));
    }

    #[test]
    fn test_seeds_exceeding_limit_truncate_alphabetically() {
        let items = names("ABC", 30);
        let out = cap_to_limit(&["Zeta", "Alpha", "Mu", "Beta"], &items, 2);
        assert_eq!(out, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_deterministic() {
        let items = names("QWERTYUIOP", 17);
        assert_eq!(cap_to_limit(&["Quito"], &items, 33), cap_to_limit(&["Quito"], &items, 33));
    }

    #[test]
    fn test_output_sorted() {
        let items = names("ZYXWVU", 30);
        let out = cap_to_limit(&[], &items, 40);
        let mut sorted = out.clone();
        sorted.sort_by_key(|s| normalize(s));
        assert_eq!(out, sorted);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index("amsterdam"), 0);
        assert_eq!(bucket_index("zurich"), 25);
        assert_eq!(bucket_index("'s-hertogenbosch"), 26);
        assert_eq!(bucket_index("ılgın"), 26);
        assert_eq!(bucket_index(""), 26);
    }
}
