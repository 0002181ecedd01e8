use std::{fmt::Display, str::FromStr};

use crate::CollectiveError;

/// Reductions supported by the collectives.
///
/// The wire operation is always a sum; `Avg` divides the summed result by the size of the
/// collective afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Avg,
}

impl FromStr for ReduceOp {
    type Err = CollectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "avg" => Ok(Self::Avg),
            _ => Err(CollectiveError::UnsupportedOperation(s.to_string())),
        }
    }
}

impl Display for ReduceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Avg => write!(f, "avg"),
        }
    }
}

impl ReduceOp {
    #[inline]
    pub fn finish_real(&self, sum: f64, size: usize) -> f64 {
        match self {
            Self::Sum => sum,
            Self::Avg => sum / size as f64,
        }
    }

    /// Integer average rounds toward negative infinity
    #[inline]
    pub fn finish_int(&self, sum: i64, size: usize) -> i64 {
        match self {
            Self::Sum => sum,
            Self::Avg => sum.div_euclid(size as i64),
        }
    }

    #[inline]
    pub fn finish_buffer(&self, sum: &mut [f64], size: usize) {
        if *self == Self::Avg {
            sum.iter_mut().for_each(|x| *x /= size as f64);
        }
    }
}
