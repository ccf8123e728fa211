//! Levenshtein distance between symbol strings.
//!
//! The primary function of this module is [distance](fn.distance.html), with
//! [indel_distance](fn.indel_distance.html) as the variant that charges a
//! replacement as one deletion plus one insertion.  Both run in `O(n * m)`
//! time and `O(m)` space on the portion of the strings that actually differs.

use crate::Symbol;
use log::trace;

/// Returns the Levenshtein distance between two strings: the minimum number
/// of single-symbol insertions, deletions and replacements needed to turn
/// `string1` into `string2`.
///
/// # Example
///
/// ```
/// use editdist::distance;
///
/// assert_eq!(distance(b"Levenshtein", b"Lenvinsten"), 4);
/// let left: Vec<char> = "flaw".chars().collect();
/// let right: Vec<char> = "lawn".chars().collect();
/// assert_eq!(distance(&left, &right), 2);
/// ```
pub fn distance<T: Symbol>(string1: &[T], string2: &[T]) -> usize {
    dp_distance(string1, string2, false)
}

/// Returns the edit distance between two strings when a replacement costs as
/// much as deleting and inserting, so only insertions and deletions are ever
/// worth taking.
///
/// This is the metric underlying [ratio](fn.ratio.html) and the per-element
/// costs of the [compare](../compare/index.html) module.
pub fn indel_distance<T: Symbol>(string1: &[T], string2: &[T]) -> usize {
    dp_distance(string1, string2, true)
}

/// Returns a similarity score in `0.0..=1.0`, computed as
/// `(len1 + len2 - indel_distance) / (len1 + len2)`.
///
/// Two empty strings are considered identical and score `1.0`.
pub fn ratio<T: Symbol>(string1: &[T], string2: &[T]) -> f64 {
    let total = string1.len() + string2.len();
    if total == 0 {
        return 1.0;
    }
    (total - indel_distance(string1, string2)) as f64 / total as f64
}

/// Trims the longest common prefix and suffix off a pair of slices, returning
/// what remains of each.
pub(crate) fn strip_common<'a, T: Eq>(string1: &'a [T], string2: &'a [T]) -> (&'a [T], &'a [T]) {
    let prefix = string1
        .iter()
        .zip(string2)
        .take_while(|(a, b)| a == b)
        .count();
    let string1 = &string1[prefix..];
    let string2 = &string2[prefix..];
    let suffix = string1
        .iter()
        .rev()
        .zip(string2.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    (
        &string1[..string1.len() - suffix],
        &string2[..string2.len() - suffix],
    )
}

/// Single-row dynamic programming distance.  With `double_replace` the
/// replacement cost is 2; otherwise it is 1 and the computation is restricted
/// to a diagonal band of half the shorter length, outside which no optimal
/// path can run.
fn dp_distance<T: Symbol>(string1: &[T], string2: &[T], double_replace: bool) -> usize {
    let (s1, s2) = strip_common(string1, string2);

    if s1.is_empty() {
        return s2.len();
    }
    if s2.is_empty() {
        return s1.len();
    }

    // make the inner loop run over the longer string
    let (s1, s2) = if s1.len() > s2.len() { (s2, s1) } else { (s1, s2) };

    // a single-symbol needle reduces to a containment test, and sidesteps the
    // band computation, which is not valid for lengths this small
    if s1.len() == 1 {
        let found = s2.contains(&s1[0]) as usize;
        return if double_replace {
            s2.len() + 1 - 2 * found
        } else {
            s2.len() - found
        };
    }

    let len1 = s1.len() + 1;
    let len2 = s2.len() + 1;
    trace!("dp_distance over a {}x{} matrix", len1, len2);
    let mut row: Vec<usize> = (0..len2).collect();

    if double_replace {
        for i in 1..len1 {
            let char1 = s1[i - 1];
            // d tracks the cell diagonally above and left, plus one
            let mut d = i;
            let mut x = i;
            for j in 1..len2 {
                if char1 == s2[j - 1] {
                    x = d - 1;
                } else {
                    x += 1;
                }
                let del = row[j] + 1;
                if x > del {
                    x = del;
                }
                d = del;
                row[j] = x;
            }
        }
        return row[len2 - 1];
    }

    // Unit replacement cost: the optimal path cannot leave a diagonal band of
    // half-width `half`, so the triangles above and below it are skipped.
    let half = len1 >> 1;
    row[0] = len1 - half - 1;
    let mut end = len2 - 1;
    for i in 1..len1 {
        let char1 = s1[i - 1];
        let mut j;
        let mut d;
        let mut x;
        if i >= len1 - half {
            // enter the row where the band does, sealing its first cell
            let offset = i - (len1 - half);
            let diag = row[offset] + (char1 != s2[offset]) as usize;
            x = row[offset + 1] + 1;
            d = x;
            if x > diag {
                x = diag;
            }
            row[offset + 1] = x;
            j = offset + 2;
        } else {
            d = i;
            x = i;
            j = 1;
        }
        if i <= half + 1 {
            end = len2 + i - half - 2;
        }
        while j <= end {
            let diag = d - 1 + (char1 != s2[j - 1]) as usize;
            x += 1;
            if x > diag {
                x = diag;
            }
            d = row[j] + 1;
            if x > d {
                x = d;
            }
            row[j] = x;
            j += 1;
        }
        // seal the band's trailing cell, which has no deletion predecessor
        if i <= half {
            let diag = d - 1 + (char1 != s2[end]) as usize;
            x += 1;
            if x > diag {
                x = diag;
            }
            row[end + 1] = x;
        }
    }
    row[len2 - 1]
}

#[cfg(test)]
mod test {
    use super::{distance, indel_distance, ratio};
    use lazy_static::lazy_static;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct TestCase {
        source: &'static [u8],
        target: &'static [u8],
        distance: usize,
        indel: usize,
    }

    lazy_static! {
        static ref TESTCASES: Vec<TestCase> = vec![
            TestCase { source: b"", target: b"", distance: 0, indel: 0 },
            TestCase { source: b"", target: b"pineapple", distance: 9, indel: 9 },
            TestCase { source: b"pineapple", target: b"", distance: 9, indel: 9 },
            TestCase { source: b"kitten", target: b"sitting", distance: 3, indel: 5 },
            TestCase { source: b"Levenshtein", target: b"Lenvinsten", distance: 4, indel: 5 },
            TestCase { source: b"Levenshtein", target: b"Levensthein", distance: 2, indel: 2 },
            TestCase { source: b"pineapple", target: b"pen", distance: 7, indel: 8 },
            TestCase { source: b"applet", target: b"pen", distance: 4, indel: 5 },
            TestCase { source: b"same", target: b"same", distance: 0, indel: 0 },
            TestCase { source: b"ab", target: b"ba", distance: 2, indel: 2 },
            TestCase { source: b"ab", target: b"cd", distance: 2, indel: 4 },
            TestCase { source: b"a", target: b"xayz", distance: 3, indel: 3 },
            TestCase { source: b"a", target: b"xyz", distance: 3, indel: 4 },
        ];
    }

    #[test]
    fn known_distances() {
        for case in TESTCASES.iter() {
            assert_eq!(
                distance(case.source, case.target),
                case.distance,
                "distance {:?} -> {:?}",
                case.source,
                case.target
            );
            assert_eq!(
                indel_distance(case.source, case.target),
                case.indel,
                "indel {:?} -> {:?}",
                case.source,
                case.target
            );
        }
    }

    #[test]
    fn wide_symbols() {
        let source: Vec<char> = "šup noha".chars().collect();
        let target: Vec<char> = "šup nohou".chars().collect();
        assert_eq!(distance(&source, &target), 2);
    }

    /// The obvious two-row formulation, kept as an oracle for the banded
    /// implementation.
    fn reference_distance(s1: &[u8], s2: &[u8], replace_cost: usize) -> usize {
        let mut row: Vec<usize> = (0..=s2.len()).collect();
        for i in 1..=s1.len() {
            let prev = row.clone();
            row[0] = i;
            for j in 1..=s2.len() {
                let sub = prev[j - 1]
                    + if s1[i - 1] == s2[j - 1] { 0 } else { replace_cost };
                row[j] = sub.min(prev[j] + 1).min(row[j - 1] + 1);
            }
        }
        row[s2.len()]
    }

    fn random_string(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
        let len = rng.gen_range(0..=max_len);
        (0..len).map(|_| rng.gen_range(b'a'..=b'd')).collect()
    }

    #[test]
    fn matches_reference_on_random_pairs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let a = random_string(&mut rng, 16);
            let b = random_string(&mut rng, 16);
            assert_eq!(
                distance(&a, &b),
                reference_distance(&a, &b, 1),
                "{:?} / {:?}",
                a,
                b
            );
            assert_eq!(
                indel_distance(&a, &b),
                reference_distance(&a, &b, 2),
                "{:?} / {:?}",
                a,
                b
            );
        }
    }

    #[test]
    fn metric_properties() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..300 {
            let a = random_string(&mut rng, 10);
            let b = random_string(&mut rng, 10);
            let c = random_string(&mut rng, 10);
            let ab = distance(&a, &b);
            let ac = distance(&a, &c);
            let bc = distance(&b, &c);
            assert_eq!(distance(&a, &a), 0);
            assert_eq!(ab, distance(&b, &a));
            assert!(ab <= a.len() + b.len());
            assert!(ab.abs_diff(ac) <= bc, "triangle violated: {:?} {:?} {:?}", a, b, c);
        }
    }

    #[test]
    fn ratio_tracks_indel_distance() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = random_string(&mut rng, 10);
            let b = random_string(&mut rng, 10);
            let total = (a.len() + b.len()) as f64;
            if total == 0.0 {
                assert_eq!(ratio(&a, &b), 1.0);
                continue;
            }
            let expected = (total - indel_distance(&a, &b) as f64) / total;
            assert!((ratio(&a, &b) - expected).abs() < 1e-12);
        }
        assert_eq!(ratio::<u8>(b"", b""), 1.0);
        assert_eq!(ratio(b"same", b"same"), 1.0);
    }
}
