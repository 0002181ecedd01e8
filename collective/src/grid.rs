use comm_engine::CommEngine;

use crate::{
    Collective, CollectiveError, CollectiveResult, DistributedVector, Payload, ReduceOp,
};

/// Reductions across the instances of an ensemble whose members all use the same mesh
/// partitioning.
///
/// Wraps the collective group produced by [`crate::split_communicators`]. Field payloads are
/// reduced segment by segment: the local segment at a given offset must describe the same degrees
/// of freedom on every process of the group, which is what
/// [`crate::check_mesh_consistent_partitioning`] verifies once per run.
#[derive(Debug, Clone)]
pub struct GridCollective<C: CommEngine> {
    comm: C,
    serial_check: bool,
}

impl<C: CommEngine> GridCollective<C> {
    pub fn new(comm: C) -> Self {
        Self::with_serial_check(comm, false)
    }

    /// Collective for ensembles of serial solves: field payloads must not be partitioned.
    pub fn serial(comm: C) -> Self {
        Self::with_serial_check(comm, true)
    }

    pub fn with_serial_check(comm: C, serial_check: bool) -> Self {
        Self { comm, serial_check }
    }

    #[inline]
    pub fn comm(&self) -> &C {
        &self.comm
    }

    #[inline]
    pub fn is_serial_check(&self) -> bool {
        self.serial_check
    }

    fn check_serial(&self, vector: &dyn DistributedVector) {
        if self.serial_check {
            assert_eq!(
                vector.partition_size(),
                1,
                "{} expects fields of serial solves, got one partitioned over {} processes",
                self.name(),
                vector.partition_size()
            );
        }
    }

    fn unsupported(&self, method: &'static str, v: &Payload) -> CollectiveError {
        CollectiveError::UnsupportedPayload {
            collective: self.name(),
            method,
            kind: v.kind().to_string(),
        }
    }

    /// Write `values` back into the field and synchronize it.
    ///
    /// `apply` is collective over the field's partition, so it runs even when the segment is
    /// rejected; the rejection is reported afterwards.
    fn write_back(vector: &mut dyn DistributedVector, values: &[f64]) -> CollectiveResult<()> {
        let replaced = vector.set_local(values);
        vector.apply();
        replaced
    }
}

impl<C: CommEngine> Collective for GridCollective<C> {
    #[inline]
    fn name(&self) -> &'static str {
        if self.serial_check {
            "SerialGridCollective"
        } else {
            "GridCollective"
        }
    }

    #[inline(always)]
    fn size(&self) -> usize {
        self.comm.size()
    }

    #[inline(always)]
    fn rank(&self) -> usize {
        self.comm.rank()
    }

    fn all_reduce(&self, v: Payload, op: ReduceOp) -> CollectiveResult<Payload> {
        let size = self.size();
        log::trace!("{} all_reduce({op}) of a {}", self.name(), v.kind());

        match v {
            Payload::Real(x) => {
                let sum = self.comm.all_reduce_sum_f64(&[x]);
                Ok(Payload::Real(op.finish_real(sum[0], size)))
            }
            Payload::Int(x) => {
                let sum = self.comm.all_reduce_sum_i64(&[x]);
                Ok(Payload::Int(op.finish_int(sum[0], size)))
            }
            Payload::Buffer(mut buf) => {
                self.comm.all_reduce_sum_f64_in_place(&mut buf);
                op.finish_buffer(&mut buf, size);
                Ok(Payload::Buffer(buf))
            }
            Payload::Field(mut vector) => {
                self.check_serial(&*vector);
                let mut sum = self.comm.all_reduce_sum_f64(vector.local());
                op.finish_buffer(&mut sum, size);
                Self::write_back(&mut *vector, &sum)?;
                Ok(Payload::Field(vector))
            }
            Payload::Multi(multi) => multi
                .try_map(|entry| self.all_reduce(entry, op))
                .map(Payload::Multi),
            Payload::Foreign(_) => Err(self.unsupported("all_reduce", &v)),
        }
    }

    fn bcast(&self, v: Payload, root: usize) -> CollectiveResult<Payload> {
        let size = self.size();
        if root >= size {
            return Err(CollectiveError::InvalidRoot { root, size });
        }
        log::trace!("{} bcast from {root} of a {}", self.name(), v.kind());

        match v {
            Payload::Real(x) => {
                let mut buf = vec![x];
                self.comm.broadcast_f64(&mut buf, root);
                Ok(Payload::Real(buf[0]))
            }
            Payload::Int(x) => {
                let mut buf = vec![x];
                self.comm.broadcast_i64(&mut buf, root);
                Ok(Payload::Int(buf[0]))
            }
            Payload::Buffer(mut buf) => {
                self.comm.broadcast_f64(&mut buf, root);
                Ok(Payload::Buffer(buf))
            }
            Payload::Field(mut vector) => {
                self.check_serial(&*vector);
                let mut segment = vector.local().to_vec();
                self.comm.broadcast_f64(&mut segment, root);
                Self::write_back(&mut *vector, &segment)?;
                Ok(Payload::Field(vector))
            }
            Payload::Multi(multi) => multi
                .try_map(|entry| self.bcast(entry, root))
                .map(Payload::Multi),
            Payload::Foreign(_) => Err(self.unsupported("bcast", &v)),
        }
    }
}
