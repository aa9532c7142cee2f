//! Ordering of categorical labels such as topics (`k1`, `k2`, ...)
//! and timepoints (`t0`, `t3`, `t12`, ...).

use fnv::FnvHashSet as HashSet;

/// Split `k12` into (`k`, 12). Returns `None` unless the label is a
/// non-empty, digit-free prefix followed by an integer.
fn split_numbered(label: &str) -> Option<(&str, u64)> {
    let pos = label.find(|c: char| c.is_ascii_digit())?;
    if pos == 0 {
        return None;
    }
    let (prefix, digits) = label.split_at(pos);
    let num = digits.parse::<u64>().ok()?;
    Some((prefix, num))
}

/// Unique labels in a stable order.
///
/// If every label is `<prefix><integer>` with one shared prefix, the
/// labels are ordered by the integer (`k2` before `k10`); otherwise
/// they are sorted lexicographically.
pub fn order_labels<'a, I>(labels: I) -> Vec<Box<str>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::default();
    let mut unique: Vec<&str> = labels.into_iter().filter(|x| seen.insert(*x)).collect();

    let numbered: Option<Vec<(&str, u64)>> = unique.iter().map(|&x| split_numbered(x)).collect();

    match numbered {
        Some(parts) if parts.windows(2).all(|w| w[0].0 == w[1].0) => {
            let mut keyed: Vec<(u64, &str)> = parts
                .iter()
                .zip(unique.iter())
                .map(|(&(_, n), &s)| (n, s))
                .collect();
            keyed.sort();
            keyed.into_iter().map(|(_, s)| s.into()).collect()
        }
        _ => {
            unique.sort_unstable();
            unique.into_iter().map(|s| s.into()).collect()
        }
    }
}
