use std::sync::Arc;

use crate::ProcessIdentity;

/// Point lookup over the set of identities currently in scope.
///
/// Consulted on every invocation of every hooked syscall, so
/// implementations must answer in O(1) expected time and be safely callable
/// from any number of threads at once without the caller holding a lock.
/// The backing structure is owned, populated and invalidated by the control
/// plane; the gate only reads it.
///
/// The filter is fail-closed: an identity that is not present is simply out
/// of scope, never an error. Filtering happens at process granularity: the
/// thread half of the identity is ignored, but still travels in the emitted
/// record for downstream correlation.
pub trait AdmissionFilter: Send + Sync {
    fn contains(&self, identity: ProcessIdentity) -> bool;
}

impl<T: AdmissionFilter + ?Sized> AdmissionFilter for &T {
    fn contains(&self, identity: ProcessIdentity) -> bool {
        (**self).contains(identity)
    }
}

impl<T: AdmissionFilter + ?Sized> AdmissionFilter for Arc<T> {
    fn contains(&self, identity: ProcessIdentity) -> bool {
        (**self).contains(identity)
    }
}
