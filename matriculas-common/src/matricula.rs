//! Matricula normalization
//!
//! Sources disagree on whether the registry office prefix `320-` is part of
//! the identifier. Comparisons across datasets always go through
//! [`normalize`].

/// Registry office prefix carried by some sources
pub const MATRICULA_PREFIX: &str = "320-";

/// Canonical form of a matricula: leading `320-` removed, then trimmed
///
/// Strip-and-trim is applied until the value stops changing, so the result
/// is a fixpoint and `normalize(normalize(x)) == normalize(x)` holds even for
/// inputs such as `"320-320-5"` or `" 320-7"`. For ordinary identifiers this
/// is a single prefix strip followed by a trim; unlike a one-shot strip it
/// also removes a repeated prefix, so `"320-320-5"` matches `"5"`.
pub fn normalize(raw: &str) -> String {
    let mut current = raw;
    loop {
        let next = current.strip_prefix(MATRICULA_PREFIX).unwrap_or(current).trim();
        if next == current {
            return next.to_string();
        }
        current = next;
    }
}

/// True when both identifiers name the same matricula
pub fn same_matricula(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
