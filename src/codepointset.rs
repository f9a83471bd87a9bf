use crate::util::SliceHelp;
use std::cmp::Ordering;

pub const CODE_POINT_MAX: u32 = 0x10FFFF;

/// A contiguous run of code points, expressed as a start and a length.
/// The run is half-open: it covers `first..(first + length)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CodePointRange {
    pub first: u32,
    pub length: u32,
}

impl CodePointRange {
    /// Construct a range covering the single code point \p cp.
    pub fn singleton(cp: u32) -> CodePointRange {
        CodePointRange {
            first: cp,
            length: 1,
        }
    }

    /// Construct a range covering \p first through \p last, inclusive.
    pub fn inclusive(first: u32, last: u32) -> CodePointRange {
        debug_assert!(first <= last, "Range out of order");
        CodePointRange {
            first,
            length: last - first + 1,
        }
    }

    /// \return one past the largest contained code point.
    pub fn end(self) -> u32 {
        debug_assert!(
            self.first.checked_add(self.length).is_some(),
            "Range end overflows"
        );
        self.first + self.length
    }

    /// \return the largest contained code point.
    pub fn last(self) -> u32 {
        debug_assert!(self.length > 0, "Empty range has no last code point");
        self.end() - 1
    }

    /// \return whether \p cp is in the range.
    pub fn contains(self, cp: u32) -> bool {
        self.first <= cp && cp < self.end()
    }

    /// \return whether self and \p rhs overlap or abut, i.e. their union is a
    /// single contiguous range.
    fn mergeable(self, rhs: CodePointRange) -> bool {
        self.first <= rhs.end() && rhs.first <= self.end()
    }

    /// Compare against another range for merging purposes: Equal means the
    /// ranges may be merged into one.
    fn mergecmp(self, rhs: CodePointRange) -> Ordering {
        if self.end() < rhs.first {
            Ordering::Less
        } else if self.first > rhs.end() {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// \return an iterator over contained code points.
    pub fn codepoints(self) -> impl Iterator<Item = u32> {
        self.first..self.end()
    }
}

/// A set of code points stored as a sorted list of disjoint, non-abutting
/// ranges. Invariant: ranges are sorted by `first`, nonempty, and separated by
/// at least one code point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodePointSet {
    ranges: Vec<CodePointRange>,
}

impl CodePointSet {
    pub fn new() -> CodePointSet {
        CodePointSet { ranges: Vec::new() }
    }

    fn assert_is_well_formed(&self) {
        if cfg!(debug_assertions) {
            let mut last_end: Option<u32> = None;
            for rr in &self.ranges {
                debug_assert!(rr.length > 0, "Empty range");
                debug_assert!(rr.first.checked_add(rr.length).is_some(), "Range overflow");
                if let Some(le) = last_end {
                    debug_assert!(rr.first > le, "Ranges overlap or abut");
                }
                last_end = Some(rr.end());
            }
        }
    }

    /// Add a range of code points to the set, merging with any existing
    /// ranges that it overlaps or abuts.
    pub fn add(&mut self, new_range: CodePointRange) {
        debug_assert!(new_range.length > 0, "Cannot add an empty range");
        let mergeable = self.ranges.equal_range_by(|r| r.mergecmp(new_range));
        debug_assert!(
            self.ranges[mergeable.clone()]
                .iter()
                .all(|r| r.mergeable(new_range)),
            "Merge range contains unmergeable ranges"
        );
        match mergeable.len() {
            0 => {
                // New range does not overlap or abut anything.
                self.ranges.insert(mergeable.start, new_range);
            }
            1 => {
                // New range merges with exactly one existing range.
                let target = &mut self.ranges[mergeable.start];
                let first = target.first.min(new_range.first);
                let end = target.end().max(new_range.end());
                *target = CodePointRange {
                    first,
                    length: end - first,
                };
            }
            _ => {
                // New range merges a run of existing ranges. The first and
                // last in the run bound the result; the rest are dropped.
                let first = self.ranges[mergeable.start].first.min(new_range.first);
                let end = self.ranges[mergeable.end - 1].end().max(new_range.end());
                self.ranges[mergeable.start] = CodePointRange {
                    first,
                    length: end - first,
                };
                self.ranges.drain((mergeable.start + 1)..mergeable.end);
            }
        };
        self.assert_is_well_formed();
    }

    /// Add a single code point.
    pub fn add_one(&mut self, cp: u32) {
        self.add(CodePointRange::singleton(cp))
    }

    /// Add all ranges of another set.
    pub fn add_set(&mut self, rhs: &CodePointSet) {
        for range in rhs.ranges() {
            self.add(*range)
        }
    }

    /// \return the sorted, disjoint, non-abutting ranges of the set.
    pub fn ranges(&self) -> &[CodePointRange] {
        self.ranges.as_slice()
    }

    /// \return whether the set contains \p cp.
    pub fn contains(&self, cp: u32) -> bool {
        let searched = self.ranges.binary_search_by(|r| {
            if r.first > cp {
                Ordering::Greater
            } else if r.last() < cp {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        });
        searched.is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cr(first: u32, last: u32) -> CodePointRange {
        CodePointRange::inclusive(first, last)
    }

    fn ranges_of(cps: &CodePointSet) -> Vec<(u32, u32)> {
        cps.ranges().iter().map(|r| (r.first, r.last())).collect()
    }

    #[test]
    fn test_ranges() {
        let r = cr(5, 10);
        assert_eq!(r.length, 6);
        assert_eq!(r.end(), 11);
        assert!(r.contains(5) && r.contains(10) && !r.contains(11) && !r.contains(4));
    }

    #[test]
    fn test_adds() {
        let mut cps = CodePointSet::new();
        cps.add(cr(10, 20));
        cps.add(cr(30, 40));
        assert_eq!(ranges_of(&cps), vec![(10, 20), (30, 40)]);

        // Overlapping merge.
        cps.add(cr(15, 35));
        assert_eq!(ranges_of(&cps), vec![(10, 40)]);

        // Abutting merge, on both sides.
        cps.add(cr(41, 45));
        cps.add(cr(5, 9));
        assert_eq!(ranges_of(&cps), vec![(5, 45)]);

        // Disjoint stays disjoint; one-apart stays disjoint.
        cps.add(cr(47, 50));
        assert_eq!(ranges_of(&cps), vec![(5, 45), (47, 50)]);

        // Bridge the gap.
        cps.add_one(46);
        assert_eq!(ranges_of(&cps), vec![(5, 50)]);
    }

    #[test]
    fn test_adds_torture() {
        // Add ranges in a scrambled order and check the result is the same.
        let mut cps = CodePointSet::new();
        let mut sorted = CodePointSet::new();
        let pieces: Vec<(u32, u32)> = vec![
            (90, 95),
            (10, 12),
            (3, 7),
            (30, 40),
            (13, 13),
            (20, 25),
            (8, 9),
            (41, 60),
            (26, 29),
        ];
        for &(a, b) in &pieces {
            cps.add(cr(a, b));
        }
        let mut in_order = pieces.clone();
        in_order.sort_unstable();
        for &(a, b) in &in_order {
            sorted.add(cr(a, b));
        }
        assert_eq!(ranges_of(&cps), ranges_of(&sorted));
        assert_eq!(ranges_of(&cps), vec![(3, 13), (20, 60), (90, 95)]);
        for cp in 0..100 {
            let expected = pieces.iter().any(|&(a, b)| a <= cp && cp <= b);
            assert_eq!(cps.contains(cp), expected, "mismatch at {}", cp);
        }
    }

    proptest::proptest! {
        #[test]
        fn test_well_formed_under_arbitrary_adds(
            pieces in proptest::collection::vec((0u32..300, 0u32..20), 0..40)
        ) {
            let mut cps = CodePointSet::new();
            for &(first, len) in &pieces {
                cps.add(cr(first, first + len));
            }
            // Sorted, disjoint and non-abutting.
            for w in cps.ranges().windows(2) {
                proptest::prop_assert!(w[0].end() < w[1].first);
            }
            for cp in 0..330 {
                let expected = pieces.iter().any(|&(a, l)| a <= cp && cp <= a + l);
                proptest::prop_assert_eq!(cps.contains(cp), expected);
            }
        }
    }

    #[test]
    fn test_add_set() {
        let mut a = CodePointSet::new();
        a.add(cr(1, 5));
        let mut b = CodePointSet::new();
        b.add(cr(4, 9));
        b.add(cr(100, 200));
        a.add_set(&b);
        assert_eq!(ranges_of(&a), vec![(1, 9), (100, 200)]);
    }
}
