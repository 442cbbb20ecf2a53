//! Stack of accumulated model-view matrices

use crate::foundation::math::Mat4;

/// Matrix stack whose entries are running products
///
/// Pushing `m` stores `top * m`, so the top is always the full transform
/// from the outermost pushed frame down to the current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixCascade {
    stack: Vec<Mat4>,
}

impl MatrixCascade {
    /// Empty cascade
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `matrix` composed with the current top
    pub fn push(&mut self, matrix: &Mat4) {
        let next = match self.stack.last() {
            Some(top) => top * matrix,
            None => *matrix,
        };
        self.stack.push(next);
    }

    /// Drop the top entry
    pub fn pop(&mut self) -> Option<Mat4> {
        self.stack.pop()
    }

    /// Accumulated transform
    pub fn top(&self) -> Option<&Mat4> {
        self.stack.last()
    }

    /// Accumulated transform, identity when empty
    pub fn top_or_identity(&self) -> Mat4 {
        self.top().copied().unwrap_or_else(Mat4::identity)
    }

    /// Depth
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// True when nothing is pushed
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
