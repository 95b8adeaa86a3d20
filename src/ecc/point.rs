use crate::ecc::field::FieldElement;
use crate::error::{BtcError, Result};
use num_bigint::BigUint;
use std::fmt;

/// A point on the short Weierstrass curve `y^2 = x^3 + a*x + b`
///
/// `coords` is `None` for the point at infinity, the group identity. The
/// curve coefficients travel with every point so that points from different
/// curves are never mixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    coords: Option<(FieldElement, FieldElement)>,
    a: FieldElement,
    b: FieldElement,
}

impl Point {
    /// Validating constructor: the coordinates must satisfy the curve equation
    pub fn new(x: FieldElement, y: FieldElement, a: FieldElement, b: FieldElement) -> Result<Point> {
        let lhs = y.mul(&y)?;
        let rhs = x.mul(&x)?.mul(&x)?.add(&a.mul(&x)?)?.add(&b)?;
        if lhs != rhs {
            return Err(BtcError::Validation(format!(
                "({}, {}) is not on the curve",
                x.num(),
                y.num()
            )));
        }
        Ok(Point {
            coords: Some((x, y)),
            a,
            b,
        })
    }

    pub fn infinity(a: FieldElement, b: FieldElement) -> Point {
        Point {
            coords: None,
            a,
            b,
        }
    }

    // Group-law results and curve constants are on the curve by construction
    pub(crate) fn from_parts_unchecked(
        x: FieldElement,
        y: FieldElement,
        a: FieldElement,
        b: FieldElement,
    ) -> Point {
        Point {
            coords: Some((x, y)),
            a,
            b,
        }
    }

    pub fn is_infinity(&self) -> bool {
        self.coords.is_none()
    }

    pub fn x(&self) -> Option<&FieldElement> {
        self.coords.as_ref().map(|(x, _)| x)
    }

    pub fn y(&self) -> Option<&FieldElement> {
        self.coords.as_ref().map(|(_, y)| y)
    }

    pub fn a(&self) -> &FieldElement {
        &self.a
    }

    pub fn b(&self) -> &FieldElement {
        &self.b
    }

    fn same_curve(&self, other: &Point) -> bool {
        self.a == other.a && self.b == other.b
    }

    fn identity(&self) -> Point {
        Point::infinity(self.a.clone(), self.b.clone())
    }

    pub fn add(&self, other: &Point) -> Result<Point> {
        if !self.same_curve(other) {
            return Err(BtcError::Validation(format!(
                "Points {self} and {other} are not on the same curve"
            )));
        }

        let (x1, y1) = match &self.coords {
            None => return Ok(other.clone()),
            Some(coords) => coords,
        };
        let (x2, y2) = match &other.coords {
            None => return Ok(self.clone()),
            Some(coords) => coords,
        };

        // Vertical line: P + (-P)
        if x1 == x2 && y1 != y2 {
            return Ok(self.identity());
        }

        let slope = if x1 != x2 {
            y2.sub(y1)?.div(&x2.sub(x1)?)?
        } else {
            // Tangent is vertical when y = 0
            if y1.is_zero() {
                return Ok(self.identity());
            }
            x1.mul(x1)?.scale(3).add(&self.a)?.div(&y1.scale(2))?
        };

        let x3 = slope.mul(&slope)?.sub(x1)?.sub(x2)?;
        let y3 = slope.mul(&x1.sub(&x3)?)?.sub(y1)?;
        Ok(Point::from_parts_unchecked(
            x3,
            y3,
            self.a.clone(),
            self.b.clone(),
        ))
    }

    /// Double-and-add, consuming the scalar least significant bit first
    pub fn scalar_mul(&self, coefficient: &BigUint) -> Result<Point> {
        let mut current = self.clone();
        let mut result = self.identity();
        for bit in 0..coefficient.bits() {
            if coefficient.bit(bit) {
                result = result.add(&current)?;
            }
            current = current.add(&current)?;
        }
        Ok(result)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.coords {
            None => write!(f, "Point(infinity)"),
            Some((x, y)) => write!(
                f,
                "Point({},{})_{}_{} FieldElement({})",
                x.num(),
                y.num(),
                self.a.num(),
                self.b.num(),
                x.prime()
            ),
        }
    }
}
