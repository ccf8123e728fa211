//! Recovering, transforming and applying edit scripts.
//!
//! An edit script is the sequence of single-symbol operations a minimal
//! transformation of one string into another consists of.  This module finds
//! such scripts, converts them to and from the coarser block-level opcode
//! form, inverts them, applies them (also partially) and extracts the runs of
//! symbols both strings share.
//!
//! # Example
//!
//! ```
//! use editdist::{find_editops, find_opcodes, apply_opcodes};
//!
//! let ops = find_editops(b"spam", b"park");
//! assert_eq!(format!("{:?}", ops), "[Delete(0, 0), Insert(3, 2), Replace(3, 3)]");
//!
//! let bops = find_opcodes(b"spam", b"park");
//! assert_eq!(apply_opcodes(b"spam", b"park", &bops), b"park");
//! ```

use crate::distance::strip_common;
use crate::{CheckError, EditOp, EditType, MatchingBlock, OpCode, Symbol};
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use log::trace;
use std::io::{self, Read, Write};

/// Finds a minimal edit script transforming `string1` into `string2`.
///
/// The script contains no `Keep` entries; symbols not named by the script are
/// implicitly carried over.  Ties between equally cheap scripts are broken in
/// favor of grouping consecutive insertions and deletions together rather
/// than interleaving them.
pub fn find_editops<T: Symbol>(string1: &[T], string2: &[T]) -> Vec<EditOp> {
    let prefix = string1
        .iter()
        .zip(string2)
        .take_while(|(a, b)| a == b)
        .count();
    let (s1, s2) = strip_common(&string1[prefix..], &string2[prefix..]);
    trace!(
        "find_editops on {}x{} symbols after trimming {} common",
        s1.len(),
        s2.len(),
        string1.len() - s1.len() + string2.len() - s2.len()
    );

    let rows = s1.len() + 1;
    let cols = s2.len() + 1;
    let mut matrix = vec![0usize; rows * cols];
    for j in 0..cols {
        matrix[j] = j;
    }
    for i in 1..rows {
        matrix[i * cols] = i;
    }
    for i in 1..rows {
        let char1 = s1[i - 1];
        let mut x = i;
        for j in 1..cols {
            let diag = matrix[(i - 1) * cols + j - 1] + (char1 != s2[j - 1]) as usize;
            x += 1;
            if x > diag {
                x = diag;
            }
            let del = matrix[(i - 1) * cols + j] + 1;
            if x > del {
                x = del;
            }
            matrix[i * cols + j] = x;
        }
    }

    editops_from_cost_matrix(s1, s2, prefix, &matrix)
}

/// Finds the block-level opcode list transforming `string1` into `string2`.
///
/// Equivalent to converting the script of [`find_editops`], so it spans both
/// strings completely, `Keep` blocks included.
pub fn find_opcodes<T: Symbol>(string1: &[T], string2: &[T]) -> Vec<OpCode> {
    editops_to_opcodes(
        &find_editops(string1, string2),
        string1.len(),
        string2.len(),
    )
}

/// Walks the cost matrix back from the last cell to the first, emitting the
/// operations of one minimal path.
///
/// The walk prefers to continue in whatever direction it last moved, so runs
/// of insertions or deletions come out contiguous; it never turns from
/// horizontal straight to vertical movement, preferring the diagonal.
/// `offset` is the length of the trimmed common prefix, added back into every
/// recovered position.
fn editops_from_cost_matrix<T: Symbol>(
    s1: &[T],
    s2: &[T],
    offset: usize,
    matrix: &[usize],
) -> Vec<EditOp> {
    let cols = s2.len() + 1;
    let mut i = s1.len();
    let mut j = s2.len();
    let n = matrix[matrix.len() - 1];
    let mut ops = Vec::with_capacity(n);
    let mut dir = 0i8;

    while i > 0 || j > 0 {
        let here = matrix[i * cols + j];
        if dir < 0 && j > 0 && here == matrix[i * cols + j - 1] + 1 {
            j -= 1;
            ops.push(EditOp {
                kind: EditType::Insert,
                spos: i + offset,
                dpos: j + offset,
            });
            continue;
        }
        if dir > 0 && i > 0 && here == matrix[(i - 1) * cols + j] + 1 {
            i -= 1;
            ops.push(EditOp {
                kind: EditType::Delete,
                spos: i + offset,
                dpos: j + offset,
            });
            continue;
        }
        if i > 0 && j > 0 && here == matrix[(i - 1) * cols + j - 1] && s1[i - 1] == s2[j - 1] {
            // a silent keep; it never appears in the script
            i -= 1;
            j -= 1;
            dir = 0;
            continue;
        }
        if i > 0 && j > 0 && here == matrix[(i - 1) * cols + j - 1] + 1 {
            i -= 1;
            j -= 1;
            ops.push(EditOp {
                kind: EditType::Replace,
                spos: i + offset,
                dpos: j + offset,
            });
            dir = 0;
            continue;
        }
        if dir == 0 && j > 0 && here == matrix[i * cols + j - 1] + 1 {
            j -= 1;
            ops.push(EditOp {
                kind: EditType::Insert,
                spos: i + offset,
                dpos: j + offset,
            });
            dir = -1;
            continue;
        }
        if dir == 0 && i > 0 && here == matrix[(i - 1) * cols + j] + 1 {
            i -= 1;
            ops.push(EditOp {
                kind: EditType::Delete,
                spos: i + offset,
                dpos: j + offset,
            });
            dir = 1;
            continue;
        }
        unreachable!("lost in the cost matrix");
    }
    ops.reverse();
    debug_assert_eq!(ops.len(), n);
    ops
}

/// Advances through the run of identical operations starting at `ops[*i]`
/// whose positions move in lock-step, updating the cursors to the end of the
/// run.
fn consume_run(ops: &[EditOp], i: &mut usize, spos: &mut usize, dpos: &mut usize) -> EditType {
    let kind = ops[*i].kind;
    loop {
        match kind {
            EditType::Replace => {
                *spos += 1;
                *dpos += 1;
            }
            EditType::Delete => *spos += 1,
            EditType::Insert => *dpos += 1,
            EditType::Keep => unreachable!("keep runs are skipped before consuming"),
        }
        *i += 1;
        if !(*i < ops.len()
            && ops[*i].kind == kind
            && ops[*i].spos == *spos
            && ops[*i].dpos == *dpos)
        {
            return kind;
        }
    }
}

/// Converts an edit script into the equivalent block-level opcode list.
///
/// `len1` and `len2` are the lengths of the strings the script applies to;
/// they size the trailing `Keep` block.  `Keep` entries in the script are
/// ignored, the gaps they leave are reconstructed from the positions of the
/// remaining operations.
pub fn editops_to_opcodes(ops: &[EditOp], len1: usize, len2: usize) -> Vec<OpCode> {
    let mut bops = Vec::new();
    let mut spos = 0;
    let mut dpos = 0;
    let mut i = 0;
    while i < ops.len() {
        while i < ops.len() && ops[i].kind == EditType::Keep {
            i += 1;
        }
        if i == ops.len() {
            break;
        }
        if spos < ops[i].spos || dpos < ops[i].dpos {
            bops.push(OpCode {
                kind: EditType::Keep,
                sbeg: spos,
                send: ops[i].spos,
                dbeg: dpos,
                dend: ops[i].dpos,
            });
            spos = ops[i].spos;
            dpos = ops[i].dpos;
        }
        let sbeg = spos;
        let dbeg = dpos;
        let kind = consume_run(ops, &mut i, &mut spos, &mut dpos);
        bops.push(OpCode {
            kind,
            sbeg,
            send: spos,
            dbeg,
            dend: dpos,
        });
    }
    if spos < len1 || dpos < len2 {
        debug_assert_eq!(len1 - spos, len2 - dpos);
        bops.push(OpCode {
            kind: EditType::Keep,
            sbeg: spos,
            send: len1,
            dbeg: dpos,
            dend: len2,
        });
    }
    bops
}

/// Expands a block-level opcode list into one operation per symbol.
///
/// With `keep_keep` the `Keep` blocks expand like the others; without it they
/// contribute nothing and the result matches what [`find_editops`] produces.
pub fn opcodes_to_editops(bops: &[OpCode], keep_keep: bool) -> Vec<EditOp> {
    let mut ops = Vec::new();
    for b in bops {
        match b.kind {
            EditType::Keep => {
                if keep_keep {
                    for j in 0..b.send - b.sbeg {
                        ops.push(EditOp {
                            kind: EditType::Keep,
                            spos: b.sbeg + j,
                            dpos: b.dbeg + j,
                        });
                    }
                }
            }
            EditType::Replace => {
                for j in 0..b.send - b.sbeg {
                    ops.push(EditOp {
                        kind: EditType::Replace,
                        spos: b.sbeg + j,
                        dpos: b.dbeg + j,
                    });
                }
            }
            EditType::Delete => {
                for j in 0..b.send - b.sbeg {
                    ops.push(EditOp {
                        kind: EditType::Delete,
                        spos: b.sbeg + j,
                        dpos: b.dbeg,
                    });
                }
            }
            EditType::Insert => {
                for j in 0..b.dend - b.dbeg {
                    ops.push(EditOp {
                        kind: EditType::Insert,
                        spos: b.sbeg,
                        dpos: b.dbeg + j,
                    });
                }
            }
        }
    }
    ops
}

/// Verifies that `ops` is a well formed (possibly partial) script over
/// strings of the given lengths.
///
/// Positions must stay within bounds, an operation pinned at the very end of
/// a string must be one that does not consume from it, and positions must be
/// non-decreasing on both sides.
pub fn check_editops(len1: usize, len2: usize, ops: &[EditOp]) -> Result<(), CheckError> {
    for o in ops {
        if o.spos > len1 || o.dpos > len2 {
            return Err(CheckError::OutOfBounds);
        }
        if o.spos == len1 && o.kind != EditType::Insert {
            return Err(CheckError::OutOfBounds);
        }
        if o.dpos == len2 && o.kind != EditType::Delete {
            return Err(CheckError::OutOfBounds);
        }
    }
    for pair in ops.windows(2) {
        if pair[1].spos < pair[0].spos || pair[1].dpos < pair[0].dpos {
            return Err(CheckError::Order);
        }
    }
    Ok(())
}

/// Verifies that `bops` is a well formed opcode list over strings of the
/// given lengths: a gap-free partition of both, with every block's range
/// lengths consistent with its kind.
pub fn check_opcodes(len1: usize, len2: usize, bops: &[OpCode]) -> Result<(), CheckError> {
    let (first, last) = match (bops.first(), bops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            // only two empty strings are covered by an empty list
            return if len1 == 0 && len2 == 0 {
                Ok(())
            } else {
                Err(CheckError::Span)
            };
        }
    };
    if first.sbeg != 0 || first.dbeg != 0 || last.send != len1 || last.dend != len2 {
        return Err(CheckError::Span);
    }
    for b in bops {
        if b.send > len1 || b.dend > len2 || b.sbeg > b.send || b.dbeg > b.dend {
            return Err(CheckError::OutOfBounds);
        }
        let slen = b.send - b.sbeg;
        let dlen = b.dend - b.dbeg;
        let shape_ok = match b.kind {
            EditType::Keep | EditType::Replace => slen == dlen && dlen > 0,
            EditType::Insert => slen == 0 && dlen > 0,
            EditType::Delete => slen > 0 && dlen == 0,
        };
        if !shape_ok {
            return Err(CheckError::Block);
        }
    }
    for pair in bops.windows(2) {
        if pair[1].sbeg != pair[0].send || pair[1].dbeg != pair[0].dend {
            return Err(CheckError::Order);
        }
    }
    Ok(())
}

/// Reverses the sense of a script in place, so that it transforms the
/// destination back into the source.
pub fn invert_editops(ops: &mut [EditOp]) {
    for op in ops {
        std::mem::swap(&mut op.spos, &mut op.dpos);
        op.kind = op.kind.inverse();
    }
}

/// Reverses the sense of an opcode list in place.
pub fn invert_opcodes(bops: &mut [OpCode]) {
    for b in bops {
        std::mem::swap(&mut b.sbeg, &mut b.dbeg);
        std::mem::swap(&mut b.send, &mut b.dend);
        b.kind = b.kind.inverse();
    }
}

/// Applies a script to `string1`, drawing inserted and replacement symbols
/// from `string2`, and returns the resulting string.
///
/// The script need not be complete: source symbols between and after the
/// listed operations are carried over untouched, so applying a prefix of a
/// script yields a partially transformed string.  The script is not
/// validated; run [`check_editops`] first when it comes from outside.
///
/// # Panics
///
/// When the script refers to positions beyond either string.
pub fn apply_editops<T: Symbol>(string1: &[T], string2: &[T], ops: &[EditOp]) -> Vec<T> {
    let mut dst = Vec::with_capacity(ops.len() + string1.len());
    let mut spos = 0;
    for op in ops {
        // carry over everything up to the operation, and through it for Keep
        let take = op.spos - spos + (op.kind == EditType::Keep) as usize;
        dst.extend_from_slice(&string1[spos..spos + take]);
        spos += take;
        match op.kind {
            EditType::Delete => spos += 1,
            EditType::Replace => {
                spos += 1;
                dst.push(string2[op.dpos]);
            }
            EditType::Insert => dst.push(string2[op.dpos]),
            EditType::Keep => {}
        }
    }
    dst.extend_from_slice(&string1[spos..]);
    dst
}

/// Applies an opcode list to `string1`, drawing inserted and replacement
/// symbols from `string2`, and returns the resulting string.
///
/// The list is not validated; run [`check_opcodes`] first when it comes from
/// outside.
///
/// # Panics
///
/// When a block refers to positions beyond either string.
pub fn apply_opcodes<T: Symbol>(string1: &[T], string2: &[T], bops: &[OpCode]) -> Vec<T> {
    let mut dst = Vec::with_capacity(string1.len() + string2.len());
    for b in bops {
        match b.kind {
            EditType::Insert | EditType::Replace => dst.extend_from_slice(&string2[b.dbeg..b.dend]),
            EditType::Keep => dst.extend_from_slice(&string1[b.sbeg..b.send]),
            EditType::Delete => {}
        }
    }
    dst
}

/// Extracts the runs of symbols a script leaves untouched.
///
/// `len1` and `len2` are the lengths of the strings the script applies to.
/// The list ends with a zero-length sentinel block at `(len1, len2)`, which
/// makes pairwise traversal by consumers uniform.
pub fn editops_matching_blocks(len1: usize, len2: usize, ops: &[EditOp]) -> Vec<MatchingBlock> {
    let mut mblocks = Vec::new();
    let mut spos = 0;
    let mut dpos = 0;
    let mut i = 0;
    while i < ops.len() {
        while i < ops.len() && ops[i].kind == EditType::Keep {
            i += 1;
        }
        if i == ops.len() {
            break;
        }
        if spos < ops[i].spos || dpos < ops[i].dpos {
            mblocks.push(MatchingBlock {
                spos,
                dpos,
                len: ops[i].spos - spos,
            });
            spos = ops[i].spos;
            dpos = ops[i].dpos;
        }
        consume_run(ops, &mut i, &mut spos, &mut dpos);
    }
    if spos < len1 || dpos < len2 {
        debug_assert_eq!(len1 - spos, len2 - dpos);
        mblocks.push(MatchingBlock {
            spos,
            dpos,
            len: len1 - spos,
        });
    }
    mblocks.push(MatchingBlock {
        spos: len1,
        dpos: len2,
        len: 0,
    });
    mblocks
}

/// Extracts the runs of symbols an opcode list keeps, without a sentinel.
///
/// `len1` sizes a trailing run when the list ends in `Keep` blocks.
pub fn opcodes_matching_blocks(len1: usize, _len2: usize, bops: &[OpCode]) -> Vec<MatchingBlock> {
    let mut mblocks = Vec::new();
    let mut i = 0;
    while i < bops.len() {
        if bops[i].kind != EditType::Keep {
            i += 1;
            continue;
        }
        let spos = bops[i].sbeg;
        let dpos = bops[i].dbeg;
        // adjacent keep blocks are folded into one run
        while i < bops.len() && bops[i].kind == EditType::Keep {
            i += 1;
        }
        let len = if i == bops.len() {
            len1 - spos
        } else {
            bops[i].sbeg - spos
        };
        mblocks.push(MatchingBlock { spos, dpos, len });
    }
    mblocks
}

/// Writes a script to `writer` in a compact network-endian format.  The
/// output can be turned back into an equivalent script using
/// [`editops_expand_from`].
pub fn editops_compress_to<W: Write>(ops: &[EditOp], writer: &mut W) -> io::Result<()> {
    writer.write_u32::<NetworkEndian>(ops.len() as u32)?;
    for op in ops {
        writer.write_u8(op.kind as u8)?;
        writer.write_u32::<NetworkEndian>(op.spos as u32)?;
        writer.write_u32::<NetworkEndian>(op.dpos as u32)?;
    }
    Ok(())
}

/// Reads a script previously written with [`editops_compress_to`].
///
/// A record with an unknown kind tag produces an `InvalidData` error.  The
/// positions are not validated against any particular strings; use
/// [`check_editops`] for that.
pub fn editops_expand_from<R: Read>(reader: &mut R) -> io::Result<Vec<EditOp>> {
    let n = reader.read_u32::<NetworkEndian>()? as usize;
    let mut ops = Vec::with_capacity(n);
    for _ in 0..n {
        let tag = reader.read_u8()?;
        let kind = EditType::from_ordinal(tag)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unknown edit kind tag"))?;
        let spos = reader.read_u32::<NetworkEndian>()? as usize;
        let dpos = reader.read_u32::<NetworkEndian>()? as usize;
        ops.push(EditOp { kind, spos, dpos });
    }
    Ok(ops)
}

/// Writes an opcode list to `writer` in a compact network-endian format.  The
/// output can be turned back into an equivalent list using
/// [`opcodes_expand_from`].
pub fn opcodes_compress_to<W: Write>(bops: &[OpCode], writer: &mut W) -> io::Result<()> {
    writer.write_u32::<NetworkEndian>(bops.len() as u32)?;
    for b in bops {
        writer.write_u8(b.kind as u8)?;
        writer.write_u32::<NetworkEndian>(b.sbeg as u32)?;
        writer.write_u32::<NetworkEndian>(b.send as u32)?;
        writer.write_u32::<NetworkEndian>(b.dbeg as u32)?;
        writer.write_u32::<NetworkEndian>(b.dend as u32)?;
    }
    Ok(())
}

/// Reads an opcode list previously written with [`opcodes_compress_to`].
///
/// A record with an unknown kind tag produces an `InvalidData` error.  The
/// ranges are not validated against any particular strings; use
/// [`check_opcodes`] for that.
pub fn opcodes_expand_from<R: Read>(reader: &mut R) -> io::Result<Vec<OpCode>> {
    let nb = reader.read_u32::<NetworkEndian>()? as usize;
    let mut bops = Vec::with_capacity(nb);
    for _ in 0..nb {
        let tag = reader.read_u8()?;
        let kind = EditType::from_ordinal(tag)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "unknown edit kind tag"))?;
        let sbeg = reader.read_u32::<NetworkEndian>()? as usize;
        let send = reader.read_u32::<NetworkEndian>()? as usize;
        let dbeg = reader.read_u32::<NetworkEndian>()? as usize;
        let dend = reader.read_u32::<NetworkEndian>()? as usize;
        bops.push(OpCode {
            kind,
            sbeg,
            send,
            dbeg,
            dend,
        });
    }
    Ok(bops)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::distance::distance;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::io::Cursor;

    macro_rules! check_editops {
        ($source: expr => $target: expr; $(($kind: ident, $spos: expr, $dpos: expr)),*) => {
            {
                let ops = find_editops($source, $target);
                assert_eq!(ops, vec![
                    $(EditOp { kind: EditType::$kind, spos: $spos, dpos: $dpos }),*
                ], "script for {:?} -> {:?}", $source, $target);
                assert_eq!(apply_editops($source, $target, &ops), $target.to_vec());
            }
        };
    }

    #[test]
    fn finding_editops() {
        check_editops!(b"spam" => b"park";
                       (Delete, 0, 0), (Insert, 3, 2), (Replace, 3, 3));
        check_editops!(b"man" => b"scotsman";
                       (Insert, 0, 0), (Insert, 0, 1), (Insert, 0, 2), (Insert, 0, 3),
                       (Insert, 0, 4));
        check_editops!(b"same" => b"same"; );
        check_editops!(b"abc" => b"";
                       (Delete, 0, 0), (Delete, 1, 0), (Delete, 2, 0));
        check_editops!(b"" => b"ab";
                       (Insert, 0, 0), (Insert, 0, 1));
    }

    #[test]
    fn finding_opcodes() {
        let bops = find_opcodes(b"spam", b"park");
        assert_eq!(
            bops,
            vec![
                OpCode { kind: EditType::Delete, sbeg: 0, send: 1, dbeg: 0, dend: 0 },
                OpCode { kind: EditType::Keep, sbeg: 1, send: 3, dbeg: 0, dend: 2 },
                OpCode { kind: EditType::Insert, sbeg: 3, send: 3, dbeg: 2, dend: 3 },
                OpCode { kind: EditType::Replace, sbeg: 3, send: 4, dbeg: 3, dend: 4 },
            ]
        );
        assert_eq!(check_opcodes(4, 4, &bops), Ok(()));
        assert_eq!(apply_opcodes(b"spam", b"park", &bops), b"park");
    }

    #[test]
    fn applying_partial_scripts() {
        let ops = find_editops(b"man", b"scotsman");
        assert_eq!(apply_editops(b"man", b"scotsman", &ops), b"scotsman");
        assert_eq!(apply_editops(b"man", b"scotsman", &ops[..3]), b"scoman");
        assert_eq!(apply_editops(b"man", b"scotsman", &[]), b"man");
    }

    #[test]
    fn matching_blocks_with_sentinel() {
        let ops = find_editops(b"spam", b"park");
        assert_eq!(
            editops_matching_blocks(4, 4, &ops),
            vec![
                MatchingBlock { spos: 1, dpos: 0, len: 2 },
                MatchingBlock { spos: 4, dpos: 4, len: 0 },
            ]
        );
        let bops = editops_to_opcodes(&ops, 4, 4);
        assert_eq!(
            opcodes_matching_blocks(4, 4, &bops),
            vec![MatchingBlock { spos: 1, dpos: 0, len: 2 }]
        );
    }

    #[test]
    fn inverse_swaps_direction() {
        let mut ops = find_editops(b"spam", b"park");
        invert_editops(&mut ops);
        assert_eq!(apply_editops(b"park", b"spam", &ops), b"spam");
        invert_editops(&mut ops);
        assert_eq!(ops, find_editops(b"spam", b"park"));

        let mut bops = find_opcodes(b"kitten", b"sitting");
        invert_opcodes(&mut bops);
        assert_eq!(check_opcodes(7, 6, &bops), Ok(()));
        assert_eq!(apply_opcodes(b"sitting", b"kitten", &bops), b"kitten");
    }

    #[test]
    fn checking_editops() {
        let good = find_editops(b"spam", b"park");
        assert_eq!(check_editops(4, 4, &good), Ok(()));
        assert_eq!(check_editops(4, 4, &[]), Ok(()));

        assert_eq!(
            check_editops(2, 4, &good),
            Err(CheckError::OutOfBounds),
            "positions beyond the source"
        );
        let pinned = [EditOp { kind: EditType::Delete, spos: 4, dpos: 0 }];
        assert_eq!(check_editops(4, 4, &pinned), Err(CheckError::OutOfBounds));
        let pinned = [EditOp { kind: EditType::Insert, spos: 0, dpos: 4 }];
        assert_eq!(check_editops(4, 4, &pinned), Err(CheckError::OutOfBounds));
        let backwards = [
            EditOp { kind: EditType::Replace, spos: 2, dpos: 2 },
            EditOp { kind: EditType::Replace, spos: 1, dpos: 1 },
        ];
        assert_eq!(check_editops(4, 4, &backwards), Err(CheckError::Order));
    }

    #[test]
    fn checking_opcodes() {
        assert_eq!(check_opcodes(0, 0, &[]), Ok(()));
        assert_eq!(check_opcodes(1, 0, &[]), Err(CheckError::Span));

        let keep = |sbeg, send, dbeg, dend| OpCode {
            kind: EditType::Keep,
            sbeg,
            send,
            dbeg,
            dend,
        };
        assert_eq!(check_opcodes(3, 3, &[keep(0, 3, 0, 3)]), Ok(()));
        assert_eq!(
            check_opcodes(4, 3, &[keep(1, 4, 0, 3)]),
            Err(CheckError::Span),
            "must start at the origin"
        );
        assert_eq!(
            check_opcodes(3, 3, &[keep(0, 2, 0, 3)]),
            Err(CheckError::Block),
            "keep spans must have equal lengths"
        );
        assert_eq!(
            check_opcodes(3, 3, &[keep(0, 1, 0, 1), keep(2, 3, 2, 3)]),
            Err(CheckError::Order),
            "blocks must chain"
        );
        assert_eq!(
            check_opcodes(2, 5, &[keep(0, 2, 0, 2), keep(2, 2, 2, 5)]),
            Err(CheckError::Block),
            "a keep cannot be one-sided"
        );
    }

    #[test]
    fn opcode_editop_conversion_roundtrip() {
        let bops = find_opcodes(b"qabxcd", b"abycdf");
        let expanded = opcodes_to_editops(&bops, true);
        assert_eq!(editops_to_opcodes(&expanded, 6, 6), bops);

        let stripped = opcodes_to_editops(&bops, false);
        assert_eq!(stripped, find_editops(b"qabxcd", b"abycdf"));
    }

    #[test]
    fn wire_roundtrip() {
        let ops = find_editops(b"spam", b"park");
        let mut buffer = Vec::new();
        editops_compress_to(&ops, &mut buffer).unwrap();
        assert_eq!(buffer.len(), 4 + ops.len() * 9);
        assert_eq!(editops_expand_from(&mut Cursor::new(&buffer)).unwrap(), ops);

        let bops = find_opcodes(b"spam", b"park");
        let mut buffer = Vec::new();
        opcodes_compress_to(&bops, &mut buffer).unwrap();
        assert_eq!(buffer.len(), 4 + bops.len() * 17);
        assert_eq!(opcodes_expand_from(&mut Cursor::new(&buffer)).unwrap(), bops);
    }

    #[test]
    fn wire_rejects_unknown_tags() {
        let mut buffer = Vec::new();
        editops_compress_to(
            &[EditOp { kind: EditType::Insert, spos: 0, dpos: 0 }],
            &mut buffer,
        )
        .unwrap();
        buffer[4] = 0x17;
        let err = editops_expand_from(&mut Cursor::new(&buffer)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    fn random_string(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
        let len = rng.gen_range(0..=max_len);
        (0..len).map(|_| rng.gen_range(b'a'..=b'c')).collect()
    }

    #[test]
    fn random_scripts_hold_their_invariants() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut rng = StdRng::seed_from_u64(0xed17);
        for _ in 0..300 {
            let a = random_string(&mut rng, 12);
            let b = random_string(&mut rng, 12);
            let ops = find_editops(&a, &b);

            assert_eq!(ops.len(), distance(&a, &b), "script is minimal");
            assert_eq!(check_editops(a.len(), b.len(), &ops), Ok(()));
            assert_eq!(apply_editops(&a, &b, &ops), b);

            let mut inverted = ops.clone();
            invert_editops(&mut inverted);
            assert_eq!(apply_editops(&b, &a, &inverted), a);
            invert_editops(&mut inverted);
            assert_eq!(inverted, ops);

            let bops = editops_to_opcodes(&ops, a.len(), b.len());
            assert_eq!(check_opcodes(a.len(), b.len(), &bops), Ok(()));
            assert_eq!(apply_opcodes(&a, &b, &bops), b);
            assert_eq!(
                editops_to_opcodes(&opcodes_to_editops(&bops, true), a.len(), b.len()),
                bops
            );

            for mb in editops_matching_blocks(a.len(), b.len(), &ops) {
                assert_eq!(
                    a[mb.spos..mb.spos + mb.len],
                    b[mb.dpos..mb.dpos + mb.len],
                    "matching block disagrees for {:?} / {:?}",
                    a,
                    b
                );
            }
        }
    }
}
