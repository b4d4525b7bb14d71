use super::{ProcessGroup, check_root};
use crate::error::{BenchError, CommError};
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use tracing::{error, info_span};

/// MPI world communicator.
///
/// MPI reports collective failures by aborting the job, so the methods here
/// only fail on argument checks made before entering MPI.
pub struct MpiGroup {
    world: SimpleCommunicator,
}

impl MpiGroup {
    pub fn new(world: SimpleCommunicator) -> Self {
        Self { world }
    }
}

impl ProcessGroup for MpiGroup {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn broadcast(&self, buf: &mut Vec<u8>, root: usize) -> Result<(), CommError> {
        check_root(root, self.size())?;
        let root_process = self.world.process_at_rank(root as i32);

        // Length first so receivers can size their buffers
        let mut len = buf.len() as u64;
        root_process.broadcast_into(&mut len);
        buf.resize(len as usize, 0);
        root_process.broadcast_into(&mut buf[..]);
        Ok(())
    }

    fn scatter(
        &self,
        chunks: Option<&[u8]>,
        chunk_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError> {
        const OP: &str = "scatter";
        check_root(root, self.size())?;
        let root_process = self.world.process_at_rank(root as i32);
        let mut chunk = vec![0u8; chunk_len];

        if self.rank() == root {
            let all = chunks.ok_or(CommError::MissingRootBuffer { op: OP, root })?;
            if all.len() != chunk_len * self.size() {
                return Err(CommError::SizeMismatch {
                    op: OP,
                    expected: chunk_len * self.size(),
                    actual: all.len(),
                });
            }
            root_process.scatter_into_root(all, &mut chunk[..]);
        } else {
            root_process.scatter_into(&mut chunk[..]);
        }
        Ok(chunk)
    }

    fn gather(&self, chunk: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError> {
        check_root(root, self.size())?;
        let root_process = self.world.process_at_rank(root as i32);

        if self.rank() == root {
            let mut assembled = vec![0u8; chunk.len() * self.size()];
            root_process.gather_into_root(chunk, &mut assembled[..]);
            Ok(Some(assembled))
        } else {
            root_process.gather_into(chunk);
            Ok(None)
        }
    }

    fn abort(&self, code: i32) {
        error!(rank = self.rank(), code, "aborting MPI job");
        self.world.abort(code)
    }
}

/// Initialize MPI, run `f` on this rank and return its value.
///
/// Any error on this rank aborts every rank in the job.
pub fn run_mpi<R, F>(f: F) -> Result<R, BenchError>
where
    F: FnOnce(&MpiGroup) -> Result<R, BenchError>,
{
    let universe = mpi::initialize().ok_or(CommError::InitFailed)?;
    let group = MpiGroup::new(universe.world());
    let _span = info_span!("rank", rank = group.rank()).entered();

    let result = f(&group);
    if let Err(e) = &result {
        error!("{}", e);
        group.abort(1);
    }
    result
}
