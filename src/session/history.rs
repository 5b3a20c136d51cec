use crate::stroke::segment::{PathSegment, SegmentId};

/// The segments of one pointer-down..pointer-up cycle, as an inclusive id range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StrokeSpan {
    pub first: SegmentId,
    pub last: SegmentId,
}

impl StrokeSpan {
    pub fn single(id: SegmentId) -> Self {
        Self {
            first: id,
            last: id,
        }
    }

    pub fn extend_to(&mut self, id: SegmentId) {
        self.last = self.last.max(id);
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.first <= id && id <= self.last
    }

    /// The run of `segments` (sorted by id) that belongs to this stroke.
    pub fn slice<'a>(&self, segments: &'a [PathSegment]) -> &'a [PathSegment] {
        let lo = segments.partition_point(|s| s.id() < self.first);
        let hi = segments.partition_point(|s| s.id() <= self.last);
        &segments[lo..hi.max(lo)]
    }
}

/// One entry per completed pointer-down..pointer-up cycle, oldest first. A cycle that emitted
/// no segment is recorded as `None`, so undoing it removes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrokeHistory {
    strokes: Vec<Option<StrokeSpan>>,
}

impl StrokeHistory {
    pub fn commit(&mut self, span: Option<StrokeSpan>) {
        self.strokes.push(span);
    }

    /// Newest entry; the outer `None` means the history is empty.
    pub fn pop(&mut self) -> Option<Option<StrokeSpan>> {
        self.strokes.pop()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn spans(&self) -> &[Option<StrokeSpan>] {
        &self.strokes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Point, Rgba8};
    use crate::stroke::segment::Dot;

    fn dot(id: u64) -> PathSegment {
        PathSegment::Dot(Dot {
            id: SegmentId(id),
            position: Point::new(id as f64, 0.0),
            width: 1.0,
            color: Rgba8::BLACK,
        })
    }

    #[test]
    fn pop_returns_strokes_newest_first() {
        let mut history = StrokeHistory::default();
        history.commit(Some(StrokeSpan::single(SegmentId(0))));
        let mut second = StrokeSpan::single(SegmentId(1));
        second.extend_to(SegmentId(3));
        history.commit(Some(second));

        assert_eq!(history.len(), 2);
        assert_eq!(history.pop(), Some(Some(second)));
        assert_eq!(history.pop(), Some(Some(StrokeSpan::single(SegmentId(0)))));
        assert_eq!(history.pop(), None);
        assert!(history.is_empty());
    }

    #[test]
    fn empty_cycles_take_a_slot() {
        let mut history = StrokeHistory::default();
        history.commit(Some(StrokeSpan::single(SegmentId(0))));
        history.commit(None);

        assert_eq!(history.len(), 2);
        assert_eq!(history.spans()[1], None);
        assert_eq!(history.pop(), Some(None));
        assert_eq!(history.pop(), Some(Some(StrokeSpan::single(SegmentId(0)))));
    }

    #[test]
    fn slice_finds_the_strokes_run() {
        let segments: Vec<_> = [0, 1, 2, 5, 6, 9].into_iter().map(dot).collect();
        let span = StrokeSpan {
            first: SegmentId(2),
            last: SegmentId(6),
        };
        let ids: Vec<_> = span.slice(&segments).iter().map(|s| s.id().0).collect();
        assert_eq!(ids, vec![2, 5, 6]);
        assert!(span.contains(SegmentId(4)));
        assert!(!span.contains(SegmentId(7)));

        let gone = StrokeSpan::single(SegmentId(7));
        assert!(gone.slice(&segments).is_empty());
    }
}
