//! What to do with an optimistic change once the server rejects it

/// Kind of persistence call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedOperation {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Restore the local state captured before the optimistic change
    Rollback,
    /// Discard local state and reload the contract from the server
    Refetch,
}

/// Maps a failed operation to its recovery. This is the single place a
/// version-checked reconciliation would plug in.
pub trait ReconcilePolicy: Send + Sync {
    fn recovery_for(&self, operation: FailedOperation) -> Recovery;
}

/// Drop failed creates locally, resynchronize everything else from the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReconcilePolicy;

impl ReconcilePolicy for DefaultReconcilePolicy {
    fn recovery_for(&self, operation: FailedOperation) -> Recovery {
        match operation {
            FailedOperation::Create => Recovery::Rollback,
            FailedOperation::Update | FailedOperation::Delete => Recovery::Refetch,
        }
    }
}

/// Never hit the network to recover; always restore the local snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollbackPolicy;

impl ReconcilePolicy for RollbackPolicy {
    fn recovery_for(&self, _operation: FailedOperation) -> Recovery {
        Recovery::Rollback
    }
}
