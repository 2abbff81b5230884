use crate::coords::Rect;

/// Nested clip regions.
///
/// Each entry stores the effective clip at that depth: the intersection of
/// the pushed rect with everything below it. Pushing can only shrink the
/// visible area; a disjoint push yields a zero-area rect that draws nothing.
#[derive(Debug, Clone, Default)]
pub struct ClipStack {
    stack: Vec<Rect>,
}

impl ClipStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `rect` and returns the new effective clip.
    pub fn push(&mut self, rect: Rect) -> Rect {
        let effective = match self.stack.last() {
            Some(top) => rect.clip_to(*top),
            None => rect,
        };
        self.stack.push(effective);
        effective
    }

    /// Pops the top entry. Returns `None` if the stack was empty.
    pub fn pop(&mut self) -> Option<Rect> {
        self.stack.pop()
    }

    /// Effective clip, or `None` when nothing is pushed (scissor disabled).
    #[inline]
    pub fn current(&self) -> Option<Rect> {
        self.stack.last().copied()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_push_intersects() {
        let mut clips = ClipStack::new();
        clips.push(Rect::new(0.0, 0.0, 100.0, 100.0));
        let eff = clips.push(Rect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(eff, Rect::new(50.0, 50.0, 50.0, 50.0));
        assert_eq!(clips.depth(), 2);
    }

    #[test]
    fn order_does_not_change_the_result() {
        let rects = [
            Rect::new(0.0, 0.0, 100.0, 80.0),
            Rect::new(20.0, 10.0, 200.0, 30.0),
            Rect::new(-5.0, 15.0, 60.0, 60.0),
        ];

        let mut forward = ClipStack::new();
        for r in rects {
            forward.push(r);
        }
        let mut backward = ClipStack::new();
        for r in rects.iter().rev() {
            backward.push(*r);
        }
        assert_eq!(forward.current(), backward.current());
        assert_eq!(forward.current(), Some(Rect::new(20.0, 15.0, 35.0, 25.0)));
    }

    #[test]
    fn disjoint_push_is_empty_not_error() {
        let mut clips = ClipStack::new();
        clips.push(Rect::new(0.0, 0.0, 10.0, 10.0));
        let eff = clips.push(Rect::new(20.0, 20.0, 5.0, 5.0));
        assert!(eff.is_empty());

        // Popping restores the wider clip.
        clips.pop();
        assert_eq!(clips.current(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mut clips = ClipStack::new();
        assert_eq!(clips.pop(), None);
        assert_eq!(clips.current(), None);
    }
}
