use std::cmp::{max, min};

/// Type shortcut for a genomic segment
///
/// Both coordinates are 1-based and inclusive, so a span `(3, 5)`
/// covers the three bases 3, 4 and 5.
pub type Span = (u32, u32);

/// Returns the intersection coordinates between two genomic segments
///
/// ```text
/// a:       --AAA-- --AAA-- --AAA-- --AAA--
/// b:       BB----- -BBBBB- --BBB-- ----BB-
/// Returns: ------- --XXX-- --XXX-- ----X--
/// ```
///
/// ```rust
/// use txpick::utils::intersect;
/// assert_eq!(intersect((3, 5), (2, 6)), Some((3, 5)));
/// assert_eq!(intersect((3, 5), (6, 8)), None);
/// ```
pub fn intersect(a: Span, b: Span) -> Option<Span> {
    if a.0 <= b.1 && a.1 >= b.0 {
        Some((max(a.0, b.0), min(a.1, b.1)))
    } else {
        None
    }
}

/// Returns the number of bases shared by two segments
pub fn overlap_amount(a: Span, b: Span) -> u32 {
    match intersect(a, b) {
        Some((lo, hi)) => hi - lo + 1,
        None => 0,
    }
}

/// Returns true if `inner` lies completely within `outer`
pub fn contains(outer: Span, inner: Span) -> bool {
    outer.0 <= inner.0 && inner.1 <= outer.1
}

/// Returns the gap between two non-overlapping segments
///
/// Overlapping or book-ended segments have a distance of 0.
pub fn distance(a: Span, b: Span) -> u32 {
    if a.1 < b.0 {
        b.0 - a.1 - 1
    } else if b.1 < a.0 {
        a.0 - b.1 - 1
    } else {
        0
    }
}

/// Returns true if the two segments overlap once `a` is padded by `flank`
/// bases on either side
pub fn overlaps_with_flank(a: Span, b: Span, flank: u32) -> bool {
    let padded = (a.0.saturating_sub(flank), a.1.saturating_add(flank));
    intersect(padded, b).is_some()
}

/// Collapses a list of segments into sorted, non-overlapping segments
///
/// Book-ended segments are merged as well, since genetically they describe
/// one contiguous stretch.
///
/// ```rust
/// use txpick::utils::merge_spans;
/// assert_eq!(merge_spans(&[(10, 20), (15, 30), (31, 35), (50, 60)]), vec![(10, 35), (50, 60)]);
/// ```
pub fn merge_spans(spans: &[Span]) -> Vec<Span> {
    let mut sorted = spans.to_vec();
    sorted.sort_unstable();
    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.0 <= last.1.saturating_add(1) => {
                if span.1 > last.1 {
                    last.1 = span.1
                }
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Returns the total number of bases covered by two sets of sorted,
/// non-overlapping segments at the same time
///
/// Both inputs must be sorted by start coordinate and internally
/// non-overlapping, which holds for finalized exon, CDS and UTR lists.
pub fn set_overlap(a: &[Span], b: &[Span]) -> u64 {
    let mut i = 0;
    let mut j = 0;
    let mut total = 0u64;
    while i < a.len() && j < b.len() {
        let lo = max(a[i].0, b[j].0);
        let hi = min(a[i].1, b[j].1);
        if lo <= hi {
            total += u64::from(hi - lo + 1);
        }
        if a[i].1 < b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    total
}

/// Returns the number of bases covered by a set of non-overlapping segments
pub fn total_length(spans: &[Span]) -> u64 {
    spans.iter().map(|span| u64::from(span.1 - span.0 + 1)).sum()
}

#[cfg(test)]
mod test_intersect {
    use super::*;

    #[test]
    fn test_no_overlap() {
        assert_eq!(intersect((3, 5), (1, 2)), None);
        assert_eq!(intersect((3, 5), (6, 7)), None);
        assert_eq!(overlap_amount((3, 5), (6, 7)), 0);
    }

    #[test]
    fn test_partial_overlap() {
        assert_eq!(intersect((3, 5), (5, 8)), Some((5, 5)));
        assert_eq!(intersect((3, 5), (1, 3)), Some((3, 3)));
        assert_eq!(overlap_amount((3, 5), (4, 8)), 2);
    }

    #[test]
    fn test_containment() {
        assert_eq!(intersect((3, 8), (4, 6)), Some((4, 6)));
        assert!(contains((3, 8), (4, 6)));
        assert!(contains((3, 8), (3, 8)));
        assert!(!contains((4, 6), (3, 8)));
        assert!(!contains((3, 8), (4, 9)));
    }
}

#[cfg(test)]
mod test_distance {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance((3, 5), (8, 10)), 2);
        assert_eq!(distance((8, 10), (3, 5)), 2);
        assert_eq!(distance((3, 5), (6, 10)), 0);
        assert_eq!(distance((3, 5), (4, 10)), 0);
    }

    #[test]
    fn test_flank() {
        assert!(overlaps_with_flank((3, 5), (8, 10), 3));
        assert!(!overlaps_with_flank((3, 5), (8, 10), 1));
        assert!(overlaps_with_flank((3, 5), (4, 10), 0));
    }
}
