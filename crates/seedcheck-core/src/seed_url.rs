//! Reading and rewriting the `seed` query parameter of task URLs.
//!
//! Rewriting works on the raw string so every other query parameter, the
//! path and the fragment come back byte-for-byte. Reading goes through a
//! real URL parser so percent-encoded values decode correctly. Both accept
//! relative URLs such as `/list?seed=1`.

use std::collections::HashSet;

use reqwest::Url;

/// Name of the query parameter carrying the seed.
pub const SEED_PARAM: &str = "seed";

/// Set or overwrite the `seed` parameter of `url`.
///
/// The parameter keeps the position of its first occurrence (or is appended
/// when absent); any further `seed` parameters are removed.
pub fn with_seed(url: &str, seed: i64) -> String {
    let (before_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };
    let (base, query) = match before_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (before_fragment, None),
    };

    let seed_pair = format!("{SEED_PARAM}={seed}");
    let mut pairs: Vec<&str> = Vec::new();
    let mut placed = false;
    for pair in query.into_iter().flat_map(|q| q.split('&')) {
        if param_name(pair) == SEED_PARAM {
            if !placed {
                pairs.push(&seed_pair);
                placed = true;
            }
        } else {
            pairs.push(pair);
        }
    }
    if !placed {
        // Drop the lone empty segment left by a bare trailing `?`.
        if pairs.len() == 1 && pairs[0].is_empty() {
            pairs.clear();
        }
        pairs.push(&seed_pair);
    }

    let mut out = String::with_capacity(url.len() + seed_pair.len() + 1);
    out.push_str(base);
    out.push('?');
    out.push_str(&pairs.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// The integer value of the `seed` parameter, if present and parsable.
pub fn extract_seed(url: &str) -> Option<i64> {
    let parsed = parse_lenient(url)?;
    let (_, value) = parsed.query_pairs().find(|(name, _)| name == SEED_PARAM)?;
    value.trim().parse().ok()
}

/// `seeds` with repeats removed, first occurrences kept in order.
pub fn distinct_seeds(seeds: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(seeds.len());
    seeds.iter().copied().filter(|s| seen.insert(*s)).collect()
}

fn param_name(pair: &str) -> &str {
    pair.split_once('=').map(|(name, _)| name).unwrap_or(pair)
}

/// Parse absolute URLs directly and resolve relative ones against a
/// placeholder origin.
fn parse_lenient(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .or_else(|| Url::parse("http://relative.invalid/").ok()?.join(url).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrites_existing_seed_in_place() {
        assert_eq!(
            with_seed("http://x/list?seed=1&page=2", 50),
            "http://x/list?seed=50&page=2"
        );
        assert_eq!(
            with_seed("http://x/list?page=2&seed=1#top", 7),
            "http://x/list?page=2&seed=7#top"
        );
    }

    #[test]
    fn test_appends_seed_when_absent() {
        assert_eq!(with_seed("http://x/list", 3), "http://x/list?seed=3");
        assert_eq!(with_seed("http://x/list?", 3), "http://x/list?seed=3");
        assert_eq!(with_seed("http://x/?q=a%20b", 3), "http://x/?q=a%20b&seed=3");
        assert_eq!(with_seed("http://x/#frag", 3), "http://x/?seed=3#frag");
    }

    #[test]
    fn test_other_params_preserved_byte_for_byte() {
        let url = "https://shop.example/search?q=red+shoes&sort=price%3Adesc&flag&seed=9&x=";
        let rewritten = with_seed(url, 100);
        assert_eq!(
            rewritten,
            "https://shop.example/search?q=red+shoes&sort=price%3Adesc&flag&seed=100&x="
        );
    }

    #[test]
    fn test_duplicate_seeds_collapse() {
        assert_eq!(with_seed("/a?seed=1&b=2&seed=3", 4), "/a?seed=4&b=2");
    }

    #[test]
    fn test_similar_param_names_untouched() {
        assert_eq!(
            with_seed("/a?seeds=1&myseed=2", 4),
            "/a?seeds=1&myseed=2&seed=4"
        );
    }

    #[test]
    fn test_extract_seed() {
        assert_eq!(extract_seed("http://x/list?seed=42"), Some(42));
        assert_eq!(extract_seed("http://x/list?seed=-3&a=1"), Some(-3));
        assert_eq!(extract_seed("/list?a=1&seed=8#frag"), Some(8));
        assert_eq!(extract_seed("http://x/list"), None);
        assert_eq!(extract_seed("http://x/list?seed=abc"), None);
        assert_eq!(extract_seed("http://x/list?seed="), None);
    }

    #[test]
    fn test_distinct_seeds_keeps_first_order() {
        assert_eq!(distinct_seeds(&[5, 1, 5, 3, 1]), vec![5, 1, 3]);
        assert!(distinct_seeds(&[]).is_empty());
    }

    #[test]
    fn test_round_trip() {
        let urls = [
            "http://x/list?seed=1",
            "http://localhost:8000/?a=1&b=two#section",
            "/relative/path",
            "https://example.org/p?seeds=5",
        ];
        for url in urls {
            for seed in [0, 1, 50, 100, -7, i64::MAX] {
                assert_eq!(extract_seed(&with_seed(url, seed)), Some(seed), "{url} {seed}");
            }
        }
    }
}
