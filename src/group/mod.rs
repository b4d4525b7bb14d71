use crate::error::CommError;

mod local;
#[cfg(feature = "mpi")]
mod mpi;

pub use self::local::{LocalGroup, run_local};
#[cfg(feature = "mpi")]
pub use self::mpi::{MpiGroup, run_mpi};

/// Handle to a fixed group of cooperating ranks.
///
/// Payloads are raw bytes; typed wrappers live in [`crate::distribute`].
/// Every collective blocks until its data movement completes, with no timeout.
pub trait ProcessGroup {
    /// This rank, in `0..size()`
    fn rank(&self) -> usize;

    /// Number of ranks, fixed for the lifetime of the group
    fn size(&self) -> usize;

    /// Replace `buf` on every rank with the contents of `buf` on `root`
    fn broadcast(&self, buf: &mut Vec<u8>, root: usize) -> Result<(), CommError>;

    /// Split `chunks` (significant on `root` only) into `size()` pieces of
    /// `chunk_len` bytes and hand piece `r` to rank `r`
    fn scatter(
        &self,
        chunks: Option<&[u8]>,
        chunk_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError>;

    /// Concatenate every rank's `chunk` on `root` in rank order; `None` elsewhere
    fn gather(&self, chunk: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError>;

    /// Tear the whole group down after a fatal error on this rank
    fn abort(&self, code: i32);
}

pub(crate) fn check_root(root: usize, size: usize) -> Result<(), CommError> {
    if root >= size {
        return Err(CommError::InvalidRoot { root, size });
    }
    Ok(())
}
