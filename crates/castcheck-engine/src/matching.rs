//! Profile name matching.

/// Fuzzy name comparison between a profile heading and a cast listing.
///
/// Matches when equal or when either contains the other, which absorbs
/// middle names, suffixes and similar formatting differences. Symmetric in
/// its arguments. An empty string is contained in everything and therefore
/// matches any name.
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}
