use super::{ProcessGroup, check_root};
use crate::error::{BenchError, CommError, ConfigError};
use crate::types::Role;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::thread;
use tracing::{error, info_span, trace};

/// In-process group: one thread per rank, one rendezvous channel per
/// ordered pair of ranks.
///
/// Channels have zero capacity, so a send completes only once the peer has
/// taken the message. When a rank's handle is dropped its peers see
/// [`CommError::Disconnected`] on their next exchange with it.
pub struct LocalGroup {
    rank: usize,
    size: usize,
    /// `to[peer]` delivers to `peer`
    to: Vec<Sender<Vec<u8>>>,
    /// `from[peer]` receives what `peer` sent to us
    from: Vec<Receiver<Vec<u8>>>,
}

impl LocalGroup {
    /// Handles for all `size` ranks, in rank order
    pub fn create(size: usize) -> Vec<LocalGroup> {
        let mut to: Vec<Vec<Sender<Vec<u8>>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut from: Vec<Vec<Option<Receiver<Vec<u8>>>>> =
            (0..size).map(|_| vec![None; size]).collect();

        for (sender, outgoing) in to.iter_mut().enumerate() {
            for (receiver, incoming) in from.iter_mut().enumerate() {
                let (tx, rx) = bounded(0);
                outgoing.push(tx);
                incoming[sender] = Some(rx);
                trace!(sender, receiver, "linked");
            }
        }

        to.into_iter()
            .zip(from)
            .enumerate()
            .map(|(rank, (to, from))| LocalGroup {
                rank,
                size,
                to,
                from: from.into_iter().flatten().collect(),
            })
            .collect()
    }

    fn send(&self, peer: usize, bytes: Vec<u8>, op: &'static str) -> Result<(), CommError> {
        self.to[peer]
            .send(bytes)
            .map_err(|_| CommError::Disconnected { op, peer })
    }

    fn recv(&self, peer: usize, op: &'static str) -> Result<Vec<u8>, CommError> {
        self.from[peer]
            .recv()
            .map_err(|_| CommError::Disconnected { op, peer })
    }

    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |&r| r != self.rank)
    }
}

impl ProcessGroup for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(&self, buf: &mut Vec<u8>, root: usize) -> Result<(), CommError> {
        check_root(root, self.size)?;
        if self.rank == root {
            for peer in self.peers() {
                self.send(peer, buf.clone(), "broadcast")?;
            }
        } else {
            *buf = self.recv(root, "broadcast")?;
        }
        Ok(())
    }

    fn scatter(
        &self,
        chunks: Option<&[u8]>,
        chunk_len: usize,
        root: usize,
    ) -> Result<Vec<u8>, CommError> {
        const OP: &str = "scatter";
        check_root(root, self.size)?;

        if self.rank == root {
            let all = chunks.ok_or(CommError::MissingRootBuffer { op: OP, root })?;
            if all.len() != chunk_len * self.size {
                return Err(CommError::SizeMismatch {
                    op: OP,
                    expected: chunk_len * self.size,
                    actual: all.len(),
                });
            }
            for peer in self.peers() {
                let start = peer * chunk_len;
                self.send(peer, all[start..start + chunk_len].to_vec(), OP)?;
            }
            let own = root * chunk_len;
            Ok(all[own..own + chunk_len].to_vec())
        } else {
            let chunk = self.recv(root, OP)?;
            if chunk.len() != chunk_len {
                return Err(CommError::SizeMismatch {
                    op: OP,
                    expected: chunk_len,
                    actual: chunk.len(),
                });
            }
            Ok(chunk)
        }
    }

    fn gather(&self, chunk: &[u8], root: usize) -> Result<Option<Vec<u8>>, CommError> {
        check_root(root, self.size)?;
        if self.rank != root {
            self.send(root, chunk.to_vec(), "gather")?;
            return Ok(None);
        }

        let mut assembled = Vec::with_capacity(chunk.len() * self.size);
        for rank in 0..self.size {
            if rank == root {
                assembled.extend_from_slice(chunk);
            } else {
                let part = self.recv(rank, "gather")?;
                if part.len() != chunk.len() {
                    return Err(CommError::SizeMismatch {
                        op: "gather",
                        expected: chunk.len(),
                        actual: part.len(),
                    });
                }
                assembled.extend_from_slice(&part);
            }
        }
        Ok(Some(assembled))
    }

    fn abort(&self, code: i32) {
        // Peers notice once this handle is dropped
        error!(rank = self.rank, code, "aborting process group");
    }
}

/// Run `f` on `size` ranks of a fresh [`LocalGroup`] and return root's value.
///
/// When any rank fails the first error that is not a knock-on disconnect is
/// returned, so the report names the rank that actually broke.
pub fn run_local<R, F>(size: usize, f: F) -> Result<R, BenchError>
where
    R: Send,
    F: Fn(&LocalGroup) -> Result<R, BenchError> + Sync,
{
    if size == 0 {
        return Err(ConfigError::ZeroRanks.into());
    }

    let groups = LocalGroup::create(size);
    let results: Vec<Result<R, BenchError>> = thread::scope(|scope| {
        let handles: Vec<_> = groups
            .into_iter()
            .map(|group| {
                let f = &f;
                scope.spawn(move || {
                    let _span = info_span!("rank", rank = group.rank()).entered();
                    let result = f(&group);
                    if let Err(e) = &result {
                        if !e.is_disconnect() {
                            group.abort(1);
                        }
                    }
                    result
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(CommError::Panicked(rank).into()))
            })
            .collect()
    });

    let mut root_value = None;
    let mut primary = None;
    let mut knock_on = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) if rank == Role::ROOT_RANK => root_value = Some(value),
            Ok(_) => {}
            Err(e) if e.is_disconnect() => {
                if knock_on.is_none() {
                    knock_on = Some(e);
                }
            }
            Err(e) => {
                if primary.is_none() {
                    primary = Some(e);
                }
            }
        }
    }

    if let Some(e) = primary.or(knock_on) {
        return Err(e);
    }
    root_value.ok_or_else(|| CommError::Panicked(Role::ROOT_RANK).into())
}
