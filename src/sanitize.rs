/*!
Path sanitizer: turns a raw, whitespace-separated AS-path field from a decoded
record into a canonical AS-path, or rejects it.

See spec.md §4.1. A path is:
- **malformed** if any token fails to parse as a non-negative integer (for
  example an AS-path containing an AS-set like `{200,201}`),
- **invalid** if, after collapsing consecutive duplicates (prepending
  compression), its length is less than 2 or its first ASN does not match the
  announcing peer's ASN,
- **valid** otherwise, in which case the canonical path is returned.
*/
use itertools::Itertools;

/// Outcome of sanitizing a raw AS-path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeOutcome {
    Valid(Vec<u32>),
    Malformed,
    Invalid,
}

impl SanitizeOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, SanitizeOutcome::Valid(_))
    }

    pub fn into_path(self) -> Option<Vec<u32>> {
        match self {
            SanitizeOutcome::Valid(path) => Some(path),
            _ => None,
        }
    }
}

/// Sanitize `as_path_text` for an announcement whose peer ASN is `peer_asn`.
pub fn sanitize_path(as_path_text: &str, peer_asn: u32) -> SanitizeOutcome {
    let mut asns = Vec::new();
    for token in as_path_text.split_whitespace() {
        match token.parse::<u32>() {
            Ok(asn) => asns.push(asn),
            Err(_) => return SanitizeOutcome::Malformed,
        }
    }

    // Collapse runs of consecutive equal ASNs (prepending compression).
    let path: Vec<u32> = asns.into_iter().dedup().collect();

    if path.len() >= 2 && path[0] == peer_asn {
        SanitizeOutcome::Valid(path)
    } else {
        SanitizeOutcome::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_consecutive_duplicates() {
        let out = sanitize_path("100 100 200 300", 100);
        assert_eq!(out, SanitizeOutcome::Valid(vec![100, 200, 300]));
    }

    #[test]
    fn rejects_malformed_as_set() {
        let out = sanitize_path("100 {200,201} 300", 100);
        assert_eq!(out, SanitizeOutcome::Malformed);
    }

    #[test]
    fn rejects_wrong_first_asn() {
        let out = sanitize_path("200 300", 100);
        assert_eq!(out, SanitizeOutcome::Invalid);
    }

    #[test]
    fn rejects_short_path() {
        // a path that collapses to a single ASN is too short even if it
        // matches the peer ASN
        let out = sanitize_path("100 100 100", 100);
        assert_eq!(out, SanitizeOutcome::Invalid);
    }

    #[test]
    fn non_adjacent_duplicates_are_kept() {
        let out = sanitize_path("100 200 100", 100);
        assert_eq!(out, SanitizeOutcome::Valid(vec![100, 200, 100]));
    }
}
