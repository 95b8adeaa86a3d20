use crate::error::{BtcError, Result};
use crate::utils::bigint::{mod_floor, mod_inverse};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use std::fmt;
use std::sync::Arc;

/// An element of the prime field GF(prime)
///
/// Elements are immutable; arithmetic returns new elements. The modulus is
/// shared behind an `Arc` so elements of the same field clone cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldElement {
    num: BigUint,
    prime: Arc<BigUint>,
}

impl FieldElement {
    pub fn new(num: BigUint, prime: BigUint) -> Result<FieldElement> {
        Self::with_prime(num, Arc::new(prime))
    }

    pub fn from_u64(num: u64, prime: u64) -> Result<FieldElement> {
        Self::new(BigUint::from(num), BigUint::from(prime))
    }

    /// Build an element in an existing field
    pub fn with_prime(num: BigUint, prime: Arc<BigUint>) -> Result<FieldElement> {
        if prime.as_ref() <= &BigUint::one() {
            return Err(BtcError::Validation(format!(
                "Field modulus {prime} must be greater than 1"
            )));
        }
        if num >= *prime {
            return Err(BtcError::Validation(format!(
                "Num {num} not in field range 0 to {}",
                prime.as_ref() - 1u32
            )));
        }
        Ok(FieldElement { num, prime })
    }

    // Caller guarantees num < prime
    pub(crate) fn from_reduced(num: BigUint, prime: Arc<BigUint>) -> FieldElement {
        FieldElement { num, prime }
    }

    pub fn num(&self) -> &BigUint {
        &self.num
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    pub(crate) fn shared_prime(&self) -> Arc<BigUint> {
        Arc::clone(&self.prime)
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// Another element of the same field
    pub fn sibling(&self, num: BigUint) -> Result<FieldElement> {
        Self::with_prime(num, self.shared_prime())
    }

    pub fn zero_of(&self) -> FieldElement {
        Self::from_reduced(BigUint::zero(), self.shared_prime())
    }

    fn check_same_field(&self, other: &FieldElement, op: &str) -> Result<()> {
        if self.prime != other.prime {
            return Err(BtcError::Validation(format!(
                "Cannot {op} elements of different fields ({} and {})",
                self.prime, other.prime
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other, "add")?;
        let num = (&self.num + &other.num) % self.prime.as_ref();
        Ok(Self::from_reduced(num, self.shared_prime()))
    }

    pub fn sub(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other, "subtract")?;
        let num = (&self.num + self.prime.as_ref() - &other.num) % self.prime.as_ref();
        Ok(Self::from_reduced(num, self.shared_prime()))
    }

    pub fn mul(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other, "multiply")?;
        let num = (&self.num * &other.num) % self.prime.as_ref();
        Ok(Self::from_reduced(num, self.shared_prime()))
    }

    /// Multiply by a small integer coefficient
    pub fn scale(&self, coefficient: u64) -> FieldElement {
        let num = (&self.num * coefficient) % self.prime.as_ref();
        Self::from_reduced(num, self.shared_prime())
    }

    /// Exponentiation; the exponent is reduced modulo `prime - 1` first, so
    /// negative exponents work.
    pub fn pow(&self, exponent: &BigInt) -> FieldElement {
        let order = self.prime.as_ref() - 1u32;
        let e = mod_floor(exponent, &order);
        Self::from_reduced(self.num.modpow(&e, &self.prime), self.shared_prime())
    }

    pub fn pow_u(&self, exponent: &BigUint) -> FieldElement {
        let order = self.prime.as_ref() - 1u32;
        let e = exponent % &order;
        Self::from_reduced(self.num.modpow(&e, &self.prime), self.shared_prime())
    }

    /// Multiplicative inverse, `self^(prime - 2)`
    pub fn inverse(&self) -> Result<FieldElement> {
        let inv = mod_inverse(&self.num, &self.prime).ok_or_else(|| {
            BtcError::Validation("Zero has no inverse in a prime field".to_string())
        })?;
        Ok(Self::from_reduced(inv, self.shared_prime()))
    }

    pub fn div(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other, "divide")?;
        self.mul(&other.inverse()?)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement_{}({})", self.prime, self.num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(num: u64, prime: u64) -> FieldElement {
        FieldElement::from_u64(num, prime).unwrap()
    }

    #[test]
    fn test_range_is_enforced() {
        assert!(FieldElement::from_u64(13, 13).is_err());
        assert!(FieldElement::from_u64(12, 13).is_ok());
        assert!(FieldElement::from_u64(0, 1).is_err());
    }

    #[test]
    fn test_add_sub_mul() {
        assert_eq!(fe(7, 13).add(&fe(12, 13)).unwrap(), fe(6, 13));
        assert_eq!(fe(29, 31).sub(&fe(4, 31)).unwrap(), fe(25, 31));
        assert_eq!(fe(15, 31).sub(&fe(30, 31)).unwrap(), fe(16, 31));
        assert_eq!(fe(24, 31).mul(&fe(19, 31)).unwrap(), fe(22, 31));
        assert_eq!(fe(3, 13).scale(5), fe(2, 13));
    }

    #[test]
    fn test_mismatched_fields_are_rejected() {
        let err = fe(2, 13).add(&fe(2, 31)).unwrap_err();
        assert!(matches!(err, BtcError::Validation(_)));
        assert!(fe(2, 13).mul(&fe(2, 31)).is_err());
        assert!(fe(2, 13).sub(&fe(2, 31)).is_err());
        assert!(fe(2, 13).div(&fe(2, 31)).is_err());
    }

    #[test]
    fn test_pow_and_negative_exponent() {
        assert_eq!(fe(17, 31).pow(&BigInt::from(3)), fe(15, 31));
        assert_eq!(fe(17, 31).pow(&BigInt::from(-3)), fe(29, 31));
        let product = fe(4, 31)
            .pow(&BigInt::from(-4))
            .mul(&fe(11, 31))
            .unwrap();
        assert_eq!(product, fe(13, 31));
    }

    #[test]
    fn test_division() {
        assert_eq!(fe(3, 31).div(&fe(24, 31)).unwrap(), fe(4, 31));
        let err = fe(3, 31).div(&fe(0, 31)).unwrap_err();
        assert!(matches!(err, BtcError::Validation(_)));
    }

    #[test]
    fn test_fermat_little_theorem() {
        let prime = 223u64;
        for n in 1..prime {
            let x = fe(n, prime);
            assert_eq!(x.pow(&BigInt::from(prime - 1)), fe(1, prime));
        }
    }
}
