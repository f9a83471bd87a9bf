//! Case canonicalization for case-insensitive matching.
//!
//! Two rule sets exist: the "unicode" rules canonicalize through the simple
//! case-fold transforms, while the legacy rules canonicalize through simple
//! uppercasing (and never map a non-ASCII code point into ASCII).

use crate::codepointset::{CodePointRange, CodePointSet};
use crate::unicodetables::{FoldRange, LEGACY_FOLDS, UNICODE_FOLDS};
use crate::util::SliceHelp;
use std::cmp::Ordering;

impl FoldRange {
    fn first(&self) -> u32 {
        self.start
    }

    fn last(&self) -> u32 {
        self.start + self.length - 1
    }

    fn add_delta(&self, cp: u32) -> u32 {
        let cs = (cp as i64) + (self.delta as i64);
        debug_assert!((0..=0x10FFFF).contains(&cs), "Delta out of bounds");
        cs as u32
    }

    /// \return the range of transformed-to code points.
    fn transformed_to(&self) -> CodePointRange {
        CodePointRange::inclusive(self.add_delta(self.first()), self.add_delta(self.last()))
    }

    fn can_apply(&self, cp: u32) -> bool {
        self.first() <= cp && cp <= self.last()
    }

    /// Apply the transform to \p cp, returning it unchanged if it falls off
    /// the modulo stride.
    fn apply(&self, cp: u32) -> u32 {
        debug_assert!(self.can_apply(cp), "Cannot apply to this code point");
        if (cp - self.first()) % (self.modulo as u32) != 0 {
            cp
        } else {
            self.add_delta(cp)
        }
    }
}

fn transforms(unicode: bool) -> &'static [FoldRange] {
    if unicode {
        UNICODE_FOLDS
    } else {
        LEGACY_FOLDS
    }
}

/// Canonicalize a single code point under the given rules.
/// \return the canonicalized code point, or \p cp if no transform applies.
pub fn canonicalize(cp: u32, unicode: bool) -> u32 {
    let table = transforms(unicode);
    let searched = table.binary_search_by(|fr| {
        if fr.first() > cp {
            Ordering::Greater
        } else if fr.last() < cp {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    });
    match searched {
        Ok(idx) => table[idx].apply(cp),
        Err(_) => cp,
    }
}

/// Add the canonical image of every code point of \p range to \p recv.
fn fold_range(range: CodePointRange, unicode: bool, recv: &mut CodePointSet) {
    let table = transforms(unicode);
    let overlaps = table.equal_range_by(|fr| {
        if fr.first() > range.last() {
            Ordering::Greater
        } else if fr.last() < range.first {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    });
    for fr in &table[overlaps] {
        let first = fr.first().max(range.first);
        let last = fr.last().min(range.last());
        for cp in first..=last {
            let cs = fr.apply(cp);
            if cs != cp {
                recv.add_one(cs)
            }
        }
    }
}

/// Add every code point whose canonical image lands in \p range to \p recv.
/// This is a linear scan across all transforms.
fn unfold_range(range: CodePointRange, unicode: bool, recv: &mut CodePointSet) {
    for fr in transforms(unicode) {
        let to = fr.transformed_to();
        if range.first > to.last() || to.first > range.last() {
            continue;
        }
        for cp in fr.first()..=fr.last() {
            let cs = fr.apply(cp);
            if cs != cp && range.contains(cs) {
                recv.add_one(cp)
            }
        }
    }
}

/// Compute the full canonical-equivalence closure of \p set: the set of all
/// code points which canonicalize to the same value as some member of \p set.
/// Applied once per bracket at bytecode-emission time.
pub fn make_canonically_equivalent(set: &CodePointSet, unicode: bool) -> CodePointSet {
    let mut result = set.clone();
    for range in set.ranges() {
        fold_range(*range, unicode, &mut result);
    }
    // Pull in the preimages of everything now present.
    let folded = result.clone();
    for range in folded.ranges() {
        unfold_range(*range, unicode, &mut result);
    }
    result
}
