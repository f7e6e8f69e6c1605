//! Spatial geometry primitives: points, bounding rectangles, records
//!
//! Dimensionality is fixed per engine instance but arbitrary per type:
//! a `Point` carries D coordinates and an `Mbr` a pair of corner points.

use super::EPSILON;
use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multidimensional point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Self { coords }
    }

    /// Origin point with the given dimensionality
    pub fn zero(dimensions: usize) -> Self {
        Self {
            coords: vec![0.0; dimensions],
        }
    }

    pub fn dimensions(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Coordinate accessor; callers validate the index against `dimensions()`
    #[inline]
    pub fn coord(&self, axis: usize) -> f64 {
        self.coords[axis]
    }

    pub fn get(&self, axis: usize) -> Option<f64> {
        self.coords.get(axis).copied()
    }

    /// Euclidean distance to another point of the same dimensionality
    pub fn distance(&self, other: &Point) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Coordinate-wise equality within [`EPSILON`]
    pub fn approx_eq(&self, other: &Point) -> bool {
        self.coords.len() == other.coords.len()
            && self
                .coords
                .iter()
                .zip(other.coords.iter())
                .all(|(a, b)| (a - b).abs() <= EPSILON)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other)
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Self::new(coords)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

/// Minimum Bounding Rectangle
///
/// The empty MBR has `lower[i] = +inf, upper[i] = -inf` so that the first
/// `expand` yields the singleton box of that point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mbr {
    lower: Point,
    upper: Point,
}

impl Mbr {
    /// Construct a validated MBR; `lower[i] <= upper[i]` must hold on every axis
    pub fn new(lower: Point, upper: Point) -> Result<Self> {
        if lower.dimensions() != upper.dimensions() {
            return Err(StorageError::InvalidMbr(format!(
                "corner dimensions differ: {} vs {}",
                lower.dimensions(),
                upper.dimensions()
            )));
        }
        for axis in 0..lower.dimensions() {
            if lower.coord(axis) > upper.coord(axis) {
                return Err(StorageError::InvalidMbr(format!(
                    "lower > upper on axis {}: {} > {}",
                    axis,
                    lower.coord(axis),
                    upper.coord(axis)
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// The empty MBR of the given dimensionality
    pub fn empty(dimensions: usize) -> Self {
        Self {
            lower: Point::new(vec![f64::INFINITY; dimensions]),
            upper: Point::new(vec![f64::NEG_INFINITY; dimensions]),
        }
    }

    /// The all-covering MBR of the given dimensionality
    pub fn universe(dimensions: usize) -> Self {
        Self {
            lower: Point::new(vec![f64::NEG_INFINITY; dimensions]),
            upper: Point::new(vec![f64::INFINITY; dimensions]),
        }
    }

    /// Degenerate box around a single point
    pub fn from_point(point: &Point) -> Self {
        Self {
            lower: point.clone(),
            upper: point.clone(),
        }
    }

    /// Tight box over a set of points; empty MBR for an empty set
    pub fn from_points<'a, I>(dimensions: usize, points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut mbr = Self::empty(dimensions);
        for p in points {
            mbr.expand(p);
        }
        mbr
    }

    pub fn lower(&self) -> &Point {
        &self.lower
    }

    pub fn upper(&self) -> &Point {
        &self.upper
    }

    pub fn dimensions(&self) -> usize {
        self.lower.dimensions()
    }

    /// An MBR is valid when it bounds at least one point
    pub fn is_valid(&self) -> bool {
        (0..self.dimensions()).all(|i| self.lower.coord(i) <= self.upper.coord(i))
    }

    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        debug_assert_eq!(point.dimensions(), self.dimensions());
        for i in 0..self.dimensions() {
            let c = point.coord(i);
            if c < self.lower.coord(i) || c > self.upper.coord(i) {
                return false;
            }
        }
        true
    }

    /// Axis-separation test. This is the coarse pruning predicate for runs,
    /// so it stays a tight O(D) loop with one early-out per axis.
    #[inline]
    pub fn intersects(&self, other: &Mbr) -> bool {
        for i in 0..self.dimensions() {
            if self.lower.coord(i) > other.upper.coord(i)
                || other.lower.coord(i) > self.upper.coord(i)
            {
                return false;
            }
        }
        true
    }

    /// Grow to include a point
    pub fn expand(&mut self, point: &Point) {
        for i in 0..self.dimensions() {
            let c = point.coord(i);
            if c < self.lower.coord(i) {
                self.lower.coords[i] = c;
            }
            if c > self.upper.coord(i) {
                self.upper.coords[i] = c;
            }
        }
    }

    /// Grow to include another MBR
    pub fn expand_mbr(&mut self, other: &Mbr) {
        if other.is_empty() {
            return;
        }
        self.expand(&other.lower);
        self.expand(&other.upper);
    }

    /// Volume in D dimensions (product of side lengths)
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (0..self.dimensions())
            .map(|i| self.upper.coord(i) - self.lower.coord(i))
            .product()
    }

    /// Margin in D dimensions (sum of side lengths)
    pub fn perimeter(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (0..self.dimensions())
            .map(|i| self.upper.coord(i) - self.lower.coord(i))
            .sum()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (0..self.dimensions())
                .map(|i| (self.lower.coord(i) + self.upper.coord(i)) / 2.0)
                .collect(),
        )
    }

    /// Area growth needed to include `point`; zero when already contained
    pub fn expansion_area(&self, point: &Point) -> f64 {
        let mut grown = self.clone();
        grown.expand(point);
        grown.area() - self.area()
    }
}

/// A point record with its payload; tombstones mark deletions and carry
/// `V::default()` as a sentinel payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRecord<V> {
    pub point: Point,
    pub value: V,
    pub tombstone: bool,
}

impl<V> SpatialRecord<V> {
    pub fn new(point: Point, value: V) -> Self {
        Self {
            point,
            value,
            tombstone: false,
        }
    }
}

impl<V: Default> SpatialRecord<V> {
    pub fn tombstone(point: Point) -> Self {
        Self {
            point,
            value: V::default(),
            tombstone: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(coords: &[f64]) -> Point {
        Point::new(coords.to_vec())
    }

    #[test]
    fn test_point_distance() {
        let a = p(&[0.0, 0.0]);
        let b = p(&[3.0, 4.0]);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_approx_eq() {
        let a = p(&[1.0, 2.0]);
        let b = p(&[1.0 + 1e-10, 2.0 - 1e-10]);
        let c = p(&[1.0 + 1e-6, 2.0]);
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&c));
        assert!(!a.approx_eq(&p(&[1.0])));
    }

    #[test]
    fn test_mbr_contains() {
        let mbr = Mbr::new(p(&[0.0, 0.0]), p(&[10.0, 10.0])).unwrap();
        assert!(mbr.contains(&p(&[5.0, 5.0])));
        assert!(mbr.contains(&p(&[0.0, 10.0])));
        assert!(!mbr.contains(&p(&[15.0, 5.0])));
    }

    #[test]
    fn test_mbr_intersects() {
        let a = Mbr::new(p(&[0.0, 0.0]), p(&[10.0, 10.0])).unwrap();
        let b = Mbr::new(p(&[5.0, 5.0]), p(&[15.0, 15.0])).unwrap();
        let c = Mbr::new(p(&[20.0, 20.0]), p(&[30.0, 30.0])).unwrap();

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        // Touching edges intersect
        let d = Mbr::new(p(&[10.0, 0.0]), p(&[20.0, 10.0])).unwrap();
        assert!(a.intersects(&d));
    }

    #[test]
    fn test_empty_mbr_intersects_nothing() {
        let empty = Mbr::empty(2);
        let a = Mbr::new(p(&[0.0, 0.0]), p(&[10.0, 10.0])).unwrap();
        assert!(!empty.intersects(&a));
        assert!(!empty.intersects(&Mbr::universe(2)));
        assert!(!a.intersects(&empty));
    }

    #[test]
    fn test_empty_mbr_expand_yields_singleton() {
        let mut mbr = Mbr::empty(2);
        assert!(mbr.is_empty());
        mbr.expand(&p(&[3.0, 7.0]));
        assert!(mbr.is_valid());
        assert_eq!(mbr.lower(), &p(&[3.0, 7.0]));
        assert_eq!(mbr.upper(), &p(&[3.0, 7.0]));
        assert_eq!(mbr.area(), 0.0);
    }

    #[test]
    fn test_invalid_mbr_rejected() {
        assert!(Mbr::new(p(&[1.0, 0.0]), p(&[0.0, 1.0])).is_err());
        assert!(Mbr::new(p(&[0.0]), p(&[1.0, 1.0])).is_err());
    }

    #[test]
    fn test_mbr_measures() {
        let mbr = Mbr::new(p(&[0.0, 0.0]), p(&[4.0, 2.0])).unwrap();
        assert_eq!(mbr.area(), 8.0);
        assert_eq!(mbr.perimeter(), 6.0);
        assert_eq!(mbr.center(), p(&[2.0, 1.0]));
    }

    #[test]
    fn test_expansion_area() {
        let mbr = Mbr::new(p(&[0.0, 0.0]), p(&[2.0, 2.0])).unwrap();
        assert_eq!(mbr.expansion_area(&p(&[1.0, 1.0])), 0.0);
        assert_eq!(mbr.expansion_area(&p(&[4.0, 2.0])), 4.0);
    }

    #[test]
    fn test_tombstone_record() {
        let t: SpatialRecord<u64> = SpatialRecord::tombstone(p(&[1.0, 1.0]));
        assert!(t.tombstone);
        assert_eq!(t.value, 0);
    }
}
