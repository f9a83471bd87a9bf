use std::cmp::Ordering;
use std::ops::Range;

/// An iterator over contiguous subslices which satisfy a predicate.
pub trait SliceHelp {
    type Item;

    /// Given that self is sorted according to f, returns the range of indexes
    /// where f would return Equal.
    fn equal_range_by<'a, F>(&'a self, f: F) -> Range<usize>
    where
        F: FnMut(&'a Self::Item) -> Ordering;
}

impl<T> SliceHelp for [T] {
    type Item = T;
    fn equal_range_by<'a, F>(&'a self, mut f: F) -> Range<usize>
    where
        F: FnMut(&'a Self::Item) -> Ordering,
    {
        let left = self
            .binary_search_by(|v| f(v).then(Ordering::Greater))
            .unwrap_err();
        let right = self[left..]
            .binary_search_by(|v| f(v).then(Ordering::Less))
            .unwrap_err()
            + left;
        left..right
    }
}

/// \return \p cp as a char, or U+FFFD REPLACEMENT CHARACTER if it is not a
/// valid scalar value (for example an unpaired surrogate).
pub fn to_char_sat(cp: u32) -> char {
    std::char::from_u32(cp).unwrap_or('\u{FFFD}')
}

#[cfg(test)]
mod tests {
    use super::SliceHelp;

    fn tester(vals: &[u32], needle: u32, expected: std::ops::Range<usize>) {
        let range = vals.equal_range_by(|v| v.cmp(&needle));
        assert_eq!(range, expected);
    }

    #[test]
    fn test_equal_range() {
        tester(&[], 0, 0..0);
        tester(&[1], 0, 0..0);
        tester(&[1], 1, 0..1);
        tester(&[1], 2, 1..1);
        tester(&[1, 3, 3, 5], 0, 0..0);
        tester(&[1, 3, 3, 5], 1, 0..1);
        tester(&[1, 3, 3, 5], 2, 1..1);
        tester(&[1, 3, 3, 5], 3, 1..3);
        tester(&[1, 3, 3, 5], 4, 3..3);
        tester(&[1, 3, 3, 5], 5, 3..4);
        tester(&[1, 3, 3, 5], 6, 4..4);
    }
}
