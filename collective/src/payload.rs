use std::{
    any::Any,
    fmt::{Debug, Display},
    sync::Arc,
};

use crate::{CollectiveError, CollectiveResult, DistributedVector};

/// Values the collectives know how to reduce and broadcast.
///
/// Collectives take a payload by value and hand back a payload of the same kind. Buffers and
/// fields are moved in, overwritten and moved out, so the storage is reused without a copy and
/// the caller never holds an alias of a value being reduced.
#[derive(Debug, Clone)]
pub enum Payload {
    Real(f64),
    Int(i64),
    Buffer(Vec<f64>),
    Field(Box<dyn DistributedVector>),
    Multi(MultiVector),
    /// Anything else; collectives reject it with [`CollectiveError::UnsupportedPayload`]
    Foreign(ForeignPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Real,
    Int,
    Buffer,
    Field,
    Multi,
    Foreign(String),
}

impl Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "real scalar"),
            Self::Int => write!(f, "integer scalar"),
            Self::Buffer => write!(f, "dense buffer"),
            Self::Field => write!(f, "distributed field vector"),
            Self::Multi => write!(f, "multi-vector"),
            Self::Foreign(type_name) => write!(f, "`{type_name}`"),
        }
    }
}

#[derive(Clone)]
pub struct ForeignPayload {
    type_name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl Debug for ForeignPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignPayload")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl ForeignPayload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: tynm::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl Payload {
    #[inline]
    pub fn field<V: DistributedVector + 'static>(vector: V) -> Self {
        Self::Field(Box::new(vector))
    }

    #[inline]
    pub fn foreign<T: Any + Send + Sync>(value: T) -> Self {
        Self::Foreign(ForeignPayload::new(value))
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Real(_) => PayloadKind::Real,
            Self::Int(_) => PayloadKind::Int,
            Self::Buffer(_) => PayloadKind::Buffer,
            Self::Field(_) => PayloadKind::Field,
            Self::Multi(_) => PayloadKind::Multi,
            Self::Foreign(foreign) => PayloadKind::Foreign(foreign.type_name.clone()),
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&[f64]> {
        match self {
            Self::Buffer(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&dyn DistributedVector> {
        match self {
            Self::Field(vector) => Some(&**vector),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&MultiVector> {
        match self {
            Self::Multi(multi) => Some(multi),
            _ => None,
        }
    }

    pub fn into_buffer(self) -> Option<Vec<f64>> {
        match self {
            Self::Buffer(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn into_field(self) -> Option<Box<dyn DistributedVector>> {
        match self {
            Self::Field(vector) => Some(vector),
            _ => None,
        }
    }

    pub fn into_multi(self) -> Option<MultiVector> {
        match self {
            Self::Multi(multi) => Some(multi),
            _ => None,
        }
    }
}

impl From<f64> for Payload {
    fn from(x: f64) -> Self {
        Self::Real(x)
    }
}

impl From<i64> for Payload {
    fn from(x: i64) -> Self {
        Self::Int(x)
    }
}

impl From<Vec<f64>> for Payload {
    fn from(buf: Vec<f64>) -> Self {
        Self::Buffer(buf)
    }
}

impl From<MultiVector> for Payload {
    fn from(multi: MultiVector) -> Self {
        Self::Multi(multi)
    }
}

/// A fixed-length sequence of payloads of one kind, each reduced independently
#[derive(Debug, Clone)]
pub struct MultiVector {
    entries: Vec<Payload>,
}

impl MultiVector {
    pub fn new(entries: Vec<Payload>) -> CollectiveResult<Self> {
        if let Some(first) = entries.first() {
            let expected = first.kind();
            if let Some(other) = entries.iter().find(|entry| entry.kind() != expected) {
                return Err(CollectiveError::HeterogeneousMultiVector {
                    expected: expected.to_string(),
                    found: other.kind().to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kind shared by all entries, `None` when empty
    pub fn kind(&self) -> Option<PayloadKind> {
        self.entries.first().map(Payload::kind)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Payload> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Payload> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<Payload> {
        self.entries
    }

    /// Apply `f` to every entry in order. `f` must preserve the kind of the entry.
    ///
    /// A failing entry does not stop the loop: `f` is collective, so every process must run it on
    /// every entry. The first error is returned once all entries are done.
    pub(crate) fn try_map<F>(self, mut f: F) -> CollectiveResult<Self>
    where
        F: FnMut(Payload) -> CollectiveResult<Payload>,
    {
        let mut first_error = None;
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match f(entry) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(Self { entries }),
        }
    }
}
