//! Immutable three dimensional vector used for states and tangent vectors.

use crate::error::VectorError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point or displacement in Lorenz phase space.
///
/// Every operation returns a new value. Arithmetic is plain `f64` so runs are
/// reproducible bit-for-bit given identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const E1: Self = Self::new(1.0, 0.0, 0.0);
    pub const E2: Self = Self::new(0.0, 1.0, 0.0);
    pub const E3: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The standard basis `[e1, e2, e3]`.
    pub const fn standard_basis() -> [Self; 3] {
        [Self::E1, Self::E2, Self::E3]
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn invert(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn subtract(self, other: Self) -> Self {
        self.add(other.invert())
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length, `dot(self, self)`.
    pub fn abs(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.abs().sqrt()
    }

    pub fn normalise(self) -> Result<Self, VectorError> {
        let len = self.length();
        if len == 0.0 {
            return Err(VectorError::DivideByZero {
                operation: "normalise",
            });
        }
        Ok(self.scale(1.0 / len))
    }

    /// Projects `self` onto the direction of `onto`.
    pub fn project(self, onto: Self) -> Result<Self, VectorError> {
        let denom = onto.abs();
        if denom == 0.0 {
            return Err(VectorError::DivideByZero {
                operation: "project",
            });
        }
        Ok(onto.scale(self.dot(onto) / denom))
    }

    pub fn distance(self, other: Self) -> f64 {
        self.subtract(other).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vector3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Vector3::add(self, rhs)
    }
}

impl Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.subtract(rhs)
    }
}

impl Neg for Vector3 {
    type Output = Self;
    fn neg(self) -> Self {
        self.invert()
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Vector3> for [f64; 3] {
    fn from(value: Vector3) -> Self {
        value.to_array()
    }
}

impl From<nalgebra::Vector3<f64>> for Vector3 {
    fn from(value: nalgebra::Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Vector3> for nalgebra::Vector3<f64> {
    fn from(value: Vector3) -> Self {
        nalgebra::Vector3::new(value.x, value.y, value.z)
    }
}
