//! Minimum-cost assignment on a rectangular matrix, by the Kuhn-Munkres
//! algorithm.
//!
//! This backs the set comparison in the [compare](../compare/index.html)
//! module: given the pairwise dissimilarity of every element of one set
//! against every element of the other, it picks the pairing with the least
//! total dissimilarity.

use log::trace;

/// Values closer to zero than this are snapped to exact zero, so that the
/// zero searches below can compare exactly.
const EPSILON: f64 = 1e-14;

/// Solves the assignment problem for an `n2 x n1` cost matrix with
/// `n1 <= n2`, stored row-major in `dists`.  Returns, for each column, the
/// index of the row it is paired with under a minimum-cost matching of all
/// columns.  The matrix is destroyed in the process.
///
/// The star and prime bookkeeping arrays hold 1-based indices so that zero
/// can mean "none".
pub(crate) fn assignment(n1: usize, n2: usize, dists: &mut [f64]) -> Vec<usize> {
    debug_assert!(n1 <= n2);
    debug_assert_eq!(dists.len(), n1 * n2);

    let mut covc = vec![false; n1]; // covered columns
    let mut covr = vec![false; n2]; // covered rows
    let mut zstarc = vec![0usize; n1]; // row of the starred zero in a column
    let mut zstarr = vec![0usize; n2]; // column of the starred zero in a row
    let mut zprimer = vec![0usize; n2]; // column of the primed zero in a row

    // subtract each column's minimum and star independent zeroes
    for j in 0..n1 {
        let mut minidx = 0;
        let mut min = dists[j];
        for i in 1..n2 {
            if min > dists[i * n1 + j] {
                minidx = i;
                min = dists[i * n1 + j];
            }
        }
        for i in 0..n2 {
            let entry = &mut dists[i * n1 + j];
            *entry -= min;
            if *entry < EPSILON {
                *entry = 0.0;
            }
        }
        if zstarc[j] == 0 && zstarr[minidx] == 0 {
            zstarc[j] = minidx + 1;
            zstarr[minidx] = j + 1;
        } else {
            for i in 0..n2 {
                if i != minidx && dists[i * n1 + j] == 0.0 && zstarc[j] == 0 && zstarr[i] == 0 {
                    zstarc[j] = i + 1;
                    zstarr[i] = j + 1;
                    break;
                }
            }
        }
    }

    loop {
        // cover every column holding a starred zero; done when all are
        let mut covered = 0;
        for j in 0..n1 {
            covc[j] = zstarc[j] != 0;
            if covc[j] {
                covered += 1;
            }
        }
        if covered == n1 {
            break;
        }

        // hunt for an uncovered zero in a row without a star; shuffle covers
        // until one turns up, manufacturing new zeroes when none exists
        let path_start = 'search: loop {
            for j in 0..n1 {
                if covc[j] {
                    continue;
                }
                for i in 0..n2 {
                    if !covr[i] && dists[i * n1 + j] == 0.0 {
                        zprimer[i] = j + 1;
                        if zstarr[i] != 0 {
                            covr[i] = true;
                            covc[zstarr[i] - 1] = false;
                            continue 'search;
                        }
                        break 'search i;
                    }
                }
            }

            // no uncovered zero anywhere: shift the smallest uncovered
            // entry out of the uncovered region
            let mut min = f64::INFINITY;
            for j in 0..n1 {
                if covc[j] {
                    continue;
                }
                for i in 0..n2 {
                    if !covr[i] && min > dists[i * n1 + j] {
                        min = dists[i * n1 + j];
                    }
                }
            }
            trace!("no uncovered zero, adjusting by {}", min);
            for i in 0..n2 {
                if !covr[i] {
                    continue;
                }
                for j in 0..n1 {
                    dists[i * n1 + j] += min;
                }
            }
            for j in 0..n1 {
                if covc[j] {
                    continue;
                }
                for i in 0..n2 {
                    let entry = &mut dists[i * n1 + j];
                    *entry -= min;
                    if *entry < EPSILON {
                        *entry = 0.0;
                    }
                }
            }
        };

        // augment: walk the alternating prime/star path from the loose
        // primed zero, starring primes and unstarring stars along it
        let mut i = path_start + 1;
        loop {
            let newstar = i;
            i -= 1;
            let j = zprimer[i] - 1;
            zstarr[i] = j + 1;
            let displaced = zstarc[j];
            zstarc[j] = newstar;
            if displaced == 0 {
                break;
            }
            i = displaced;
        }
        for v in zprimer.iter_mut() {
            *v = 0;
        }
        for v in covr.iter_mut() {
            *v = false;
        }
        for v in covc.iter_mut() {
            *v = false;
        }
    }

    zstarc.iter().map(|&star| star - 1).collect()
}
