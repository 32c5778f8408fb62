use std::fmt;

// Shape — N-dimensional shape representation
//
// A Shape is the ordered list of axis lengths of a tensor:
//   - Scalar: Shape([])        — 0 dimensions, 1 element
//   - Vector: Shape([3])       — 1 dimension, 3 elements
//   - Batch:  Shape([1024, 3]) — 1024 three-vectors
//
// Kernels that work along one axis view the shape as (outer, axis, inner):
// for [4, 3, 5] split at axis 1 that is outer = 4, inner = 5, and element
// (o, k, i) sits at o * 3 * 5 + k * 5 + i in row-major order.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions (0 for scalar, 1 for vector, 2 for matrix, etc.).
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    /// A scalar shape [] has 1 element.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Size of a specific dimension.
    pub fn dim(&self, d: usize) -> crate::Result<usize> {
        self.0.get(d).copied().ok_or(crate::Error::InvalidAxis {
            axis: d as i64,
            rank: self.rank(),
        })
    }

    /// Split around `axis` into (outer, axis length, inner) element counts.
    ///
    /// The caller guarantees `axis < rank`.
    pub fn split_at_axis(&self, axis: usize) -> (usize, usize, usize) {
        let outer = self.0[..axis].iter().product::<usize>();
        let inner = self.0[axis + 1..].iter().product::<usize>();
        (outer, self.0[axis], inner)
    }

    /// Copy of this shape with one axis replaced.
    pub fn with_dim(&self, axis: usize, len: usize) -> Shape {
        let mut dims = self.0.clone();
        dims[axis] = len;
        Shape(dims)
    }

    /// The first axis (lowest index) whose length equals `len`.
    pub fn first_axis_of_len(&self, len: usize) -> Option<usize> {
        self.0.iter().position(|&d| d == len)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// Convenient From implementations
// These let you write: Shape::from((3, 3)) instead of Shape::new(vec![3, 3])

impl From<()> for Shape {
    /// Scalar shape (0 dimensions).
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize,)> for Shape {
    fn from((d0,): (usize,)) -> Self {
        Shape(vec![d0])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2, d3])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::from(());
        assert_eq!(s.rank(), 0);
        assert_eq!(s.elem_count(), 1);
    }

    #[test]
    fn test_empty_axis_has_no_elements() {
        let s = Shape::from((4, 0));
        assert_eq!(s.elem_count(), 0);
    }

    #[test]
    fn test_split_at_axis() {
        let s = Shape::from((4, 3, 5));
        assert_eq!(s.split_at_axis(0), (1, 4, 15));
        assert_eq!(s.split_at_axis(1), (4, 3, 5));
        assert_eq!(s.split_at_axis(2), (12, 5, 1));
    }

    #[test]
    fn test_first_axis_of_len() {
        assert_eq!(Shape::from((1024, 3, 1)).first_axis_of_len(3), Some(1));
        assert_eq!(Shape::from((3, 3)).first_axis_of_len(3), Some(0));
        assert_eq!(Shape::from((2, 4)).first_axis_of_len(3), None);
    }

    #[test]
    fn test_dim_out_of_range() {
        let s = Shape::from((2, 3));
        assert_eq!(s.dim(1).unwrap(), 3);
        assert!(s.dim(2).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Shape::from((3, 4))), "[3, 4]");
    }
}
