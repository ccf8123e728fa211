//! Approximate generalized medians of weighted string sets.
//!
//! A generalized median of a set of strings is a string, not necessarily one
//! of the inputs, minimizing the sum of weighted edit distances to all of
//! them.  Finding a true median is intractable, so this module approximates:
//! [greedy_median](fn.greedy_median.html) grows a candidate symbol by symbol,
//! [median_improve](fn.median_improve.html) polishes an existing candidate
//! with single-symbol perturbations, and [set_median](fn.set_median.html)
//! simply picks the best of the inputs themselves.
//!
//! # Example
//!
//! ```
//! use editdist::greedy_median;
//!
//! let strings: &[&[u8]] = &[b"SpSm", b"mpamm", b"Spam", b"Spa", b"Sua", b"hSam"];
//! let weights = [1.0; 6];
//! assert_eq!(greedy_median(strings, &weights), b"Spam");
//! ```
//!
//! The workhorse of the first two algorithms is a per-input distance matrix
//! row, updated incrementally as the candidate grows or is perturbed, so no
//! evaluation ever recomputes a full matrix from scratch.

use crate::distance::distance;
use crate::Symbol;
use log::trace;
use rustc_hash::FxHashSet;

/// Collects the distinct symbols appearing in any input, as a sorted dense
/// list the candidate loops can iterate over.
fn symbol_set<T: Symbol>(strings: &[&[T]]) -> Vec<T> {
    let mut present = FxHashSet::default();
    for string in strings {
        for &symbol in *string {
            present.insert(symbol);
        }
    }
    let mut symlist: Vec<T> = present.into_iter().collect();
    symlist.sort_unstable();
    symlist
}

/// Recomputes every per-input matrix row after `symbol` has been committed
/// at the end of the current candidate prefix.  `row[0]` of the scratch must
/// already hold the new prefix length, which doubles as the stored offset.
fn commit_symbol<T: Symbol>(
    symbol: T,
    strings: &[&[T]],
    rows: &mut [Vec<usize>],
    row: &mut [usize],
) {
    for (string, oldrow) in strings.iter().zip(rows) {
        for k in 1..=string.len() {
            let del = oldrow[k] + 1;
            let ins = row[k - 1] + 1;
            let diag = oldrow[k - 1] + (symbol != string[k - 1]) as usize;
            row[k] = if ins > diag { diag } else { ins };
            if row[k] > del {
                row[k] = del;
            }
        }
        oldrow.copy_from_slice(&row[..=string.len()]);
    }
}

/// Builds an approximate generalized median by growing a candidate one
/// symbol at a time.
///
/// Each round simulates appending every alphabet symbol to every per-input
/// matrix row and keeps the symbol whose rows promise the smallest weighted
/// total if the candidate were extended further (the minimum cell of the
/// simulated row, not its final cell).  Growth stops once the candidate is
/// longer than every input and the total distance stopped improving, or at
/// twice the longest input plus one; the best prefix seen is returned, which
/// may be empty.
///
/// # Panics
///
/// When `strings` and `weights` have different lengths.
pub fn greedy_median<T: Symbol>(strings: &[&[T]], weights: &[f64]) -> Vec<T> {
    assert_eq!(
        strings.len(),
        weights.len(),
        "one weight per string is required"
    );
    let symlist = symbol_set(strings);
    if symlist.is_empty() {
        return Vec::new();
    }
    let maxlen = strings.iter().map(|s| s.len()).max().unwrap_or(0);
    let stoplen = 2 * maxlen + 1;

    // one distance matrix row per input, against the empty candidate
    let mut rows: Vec<Vec<usize>> = strings.iter().map(|s| (0..=s.len()).collect()).collect();
    let mut row = vec![0usize; stoplen + 1];

    let mut median: Vec<T> = Vec::with_capacity(stoplen);
    let mut mediandist: Vec<f64> = Vec::with_capacity(stoplen + 1);
    mediandist.push(
        strings
            .iter()
            .zip(weights)
            .map(|(s, w)| s.len() as f64 * w)
            .sum(),
    );

    for len in 1..=stoplen {
        let mut minminsum = f64::INFINITY;
        let mut best_symbol = symlist[0];
        let mut best_total = 0.0;
        for &symbol in &symlist {
            let mut totaldist = 0.0;
            let mut minsum = 0.0;
            for ((string, ri), weight) in strings.iter().zip(&rows).zip(weights) {
                // simulate the row another matrix row down, tracking both its
                // final cell and its minimum
                let mut x = len;
                let mut min = len;
                for (k, &c) in string.iter().enumerate() {
                    let diag = ri[k] + (symbol != c) as usize;
                    x += 1;
                    if x > diag {
                        x = diag;
                    }
                    let del = ri[k + 1] + 1;
                    if x > del {
                        x = del;
                    }
                    if x < min {
                        min = x;
                    }
                }
                minsum += min as f64 * weight;
                totaldist += x as f64 * weight;
            }
            if minsum < minminsum {
                minminsum = minsum;
                best_total = totaldist;
                best_symbol = symbol;
            }
        }
        median.push(best_symbol);
        mediandist.push(best_total);
        trace!("greedy median grew to {} symbols, total distance {}", len, best_total);

        if len == stoplen || (len > maxlen && mediandist[len] > mediandist[len - 1]) {
            break;
        }
        row[0] = len;
        commit_symbol(best_symbol, strings, &mut rows, &mut row);
    }

    // the best prefix is the answer, even if growth overshot it
    let mut bestlen = 0;
    for len in 1..mediandist.len() {
        if mediandist[len] < mediandist[bestlen] {
            bestlen = len;
        }
    }
    median.truncate(bestlen);
    median
}

/// Finishes the distance computation for a specific candidate tail, given
/// per-input rows covering the committed prefix, and returns the weighted
/// total distance.  The stored rows are left untouched; `row` is scratch.
///
/// `row[0]` of each stored row holds the committed prefix length, which
/// anchors the first column of the completed matrix.
fn finish_distance_computations<T: Symbol>(
    tail: &[T],
    strings: &[&[T]],
    weights: &[f64],
    rows: &[Vec<usize>],
    row: &mut [usize],
) -> f64 {
    let mut distsum = 0.0;
    if tail.is_empty() {
        for ((string, rowi), weight) in strings.iter().zip(rows).zip(weights) {
            distsum += rowi[string.len()] as f64 * weight;
        }
        return distsum;
    }

    for ((string, rowi), weight) in strings.iter().zip(rows).zip(weights) {
        // trim the common suffix of the tail and this input; the prefix
        // cannot be trimmed, the stored row already accounts for it
        let mut len = tail.len();
        let mut leni = string.len();
        while len > 0 && leni > 0 && string[leni - 1] == tail[len - 1] {
            len -= 1;
            leni -= 1;
        }
        if len == 0 {
            distsum += rowi[leni] as f64 * weight;
            continue;
        }
        let offset = rowi[0];
        if leni == 0 {
            distsum += (offset + len) as f64 * weight;
            continue;
        }

        row[..=leni].copy_from_slice(&rowi[..=leni]);
        for i in 1..=len {
            let char1 = tail[i - 1];
            let mut d = i + offset;
            let mut x = i + offset;
            for k in 1..=leni {
                let diag = d - 1 + (char1 != string[k - 1]) as usize;
                x += 1;
                if x > diag {
                    x = diag;
                }
                d = row[k] + 1;
                if x > d {
                    x = d;
                }
                row[k] = x;
            }
        }
        distsum += row[leni] as f64 * weight;
    }
    distsum
}

/// What a perturbation pass decided to do at one position.
#[derive(PartialEq)]
enum Perturbation<T> {
    Keep,
    Replace(T),
    Insert(T),
    Delete,
}

/// Refines a candidate median with single-symbol perturbations.
///
/// Every position is offered a replacement, an insertion and a deletion over
/// the whole alphabet; the cheapest improvement is applied before moving on.
/// The result never has a greater weighted total distance than `candidate`.
///
/// # Panics
///
/// When `strings` and `weights` have different lengths.
pub fn median_improve<T: Symbol>(candidate: &[T], strings: &[&[T]], weights: &[f64]) -> Vec<T> {
    assert_eq!(
        strings.len(),
        weights.len(),
        "one weight per string is required"
    );
    let symlist = symbol_set(strings);
    if symlist.is_empty() {
        return Vec::new();
    }
    let maxlen = strings.iter().map(|s| s.len()).max().unwrap_or(0);
    let stoplen = 2 * maxlen + 1;

    let mut rows: Vec<Vec<usize>> = strings.iter().map(|s| (0..=s.len()).collect()).collect();
    let mut row = vec![0usize; stoplen + 2];

    // buf[0] is a scratch slot for simulating insertions; the candidate
    // itself lives at buf[1..=medlen]
    let mut buf: Vec<T> = Vec::with_capacity(candidate.len().max(stoplen) + 2);
    buf.push(symlist[0]);
    buf.extend_from_slice(candidate);
    let mut medlen = candidate.len();

    let mut minminsum =
        finish_distance_computations(&buf[1..=medlen], strings, weights, &rows, &mut row);

    let mut pos = 0;
    while pos <= medlen {
        let mut chosen = Perturbation::Keep;

        if pos < medlen {
            let orig = buf[pos + 1];
            for &symbol in &symlist {
                if symbol == orig {
                    continue;
                }
                buf[pos + 1] = symbol;
                let sum = finish_distance_computations(
                    &buf[pos + 1..=medlen],
                    strings,
                    weights,
                    &rows,
                    &mut row,
                );
                if sum < minminsum {
                    minminsum = sum;
                    chosen = Perturbation::Replace(symbol);
                }
            }
            buf[pos + 1] = orig;
        }
        {
            // an insertion before pos is simulated by extending the tail one
            // slot to the left, into the scratch slot
            let orig = buf[pos];
            for &symbol in &symlist {
                buf[pos] = symbol;
                let sum = finish_distance_computations(
                    &buf[pos..=medlen],
                    strings,
                    weights,
                    &rows,
                    &mut row,
                );
                if sum < minminsum {
                    minminsum = sum;
                    chosen = Perturbation::Insert(symbol);
                }
            }
            buf[pos] = orig;
        }
        if pos < medlen {
            let sum = finish_distance_computations(
                &buf[pos + 2..=medlen],
                strings,
                weights,
                &rows,
                &mut row,
            );
            if sum < minminsum {
                minminsum = sum;
                chosen = Perturbation::Delete;
            }
        }

        match chosen {
            Perturbation::Replace(symbol) => {
                trace!("replacing symbol at {}", pos);
                buf[pos + 1] = symbol;
            }
            Perturbation::Insert(symbol) => {
                trace!("inserting symbol at {}", pos);
                buf.insert(pos + 1, symbol);
                medlen += 1;
            }
            Perturbation::Delete => {
                trace!("deleting symbol at {}", pos);
                buf.remove(pos + 1);
                medlen -= 1;
            }
            Perturbation::Keep => {}
        }
        debug_assert!(medlen <= stoplen);

        // a deletion leaves the committed prefix as it was, so the rows stay
        // valid and the position does not advance
        if chosen != Perturbation::Delete {
            if pos == medlen {
                break;
            }
            row[0] = pos + 1;
            commit_symbol(buf[pos + 1], strings, &mut rows, &mut row);
            pos += 1;
        }
    }

    buf.remove(0);
    buf.truncate(medlen);
    buf
}

/// Picks the input string with the smallest weighted total distance to all
/// the other inputs.
///
/// Pairwise distances are cached in a triangular table as they are computed,
/// and each row's summation bails out as soon as it exceeds the best total
/// seen, so many pairs are never evaluated at all.
///
/// # Panics
///
/// When `strings` and `weights` have different lengths.
pub fn set_median<T: Symbol>(strings: &[&[T]], weights: &[f64]) -> Vec<T> {
    assert_eq!(
        strings.len(),
        weights.len(),
        "one weight per string is required"
    );
    let n = strings.len();
    if n == 0 {
        return Vec::new();
    }

    // negative marks a pair not yet computed
    let mut distances: Vec<i64> = vec![-1; n * (n - 1) / 2];
    let mut minidx = 0;
    let mut mindist = f64::INFINITY;

    for i in 0..n {
        let stri = strings[i];
        let mut dist = 0.0;
        let mut j = 0;
        while j < i && dist < mindist {
            let cached = distances[triangular_index(i, j)];
            let d = if cached >= 0 {
                cached as usize
            } else {
                distance(strings[j], stri)
            };
            dist += weights[j] * d as f64;
            j += 1;
        }
        j += 1; // no need to compare the string with itself
        while j < n && dist < mindist {
            let d = distance(strings[j], stri);
            distances[triangular_index(j, i)] = d as i64;
            dist += weights[j] * d as f64;
            j += 1;
        }
        if dist < mindist {
            mindist = dist;
            minidx = i;
            trace!("set median candidate {} with total distance {}", i, dist);
        }
    }

    strings[minidx].to_vec()
}

/// Index of the unordered pair `(i, j)`, `j < i`, in the triangular cache.
fn triangular_index(i: usize, j: usize) -> usize {
    i.saturating_sub(1) * i.saturating_sub(2) / 2 + j
}
