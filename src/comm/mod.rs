//! Communication backends for the PFASST time pipeline: intra-process
//! (threads over a shared mailbox) and inter-process (MPI) message passing.
//!
//! Wire format conventions:
//! - State payloads are contiguous LE `f64` arrays with no header; sender and
//!   receiver agree on the DOF count out of band (fixed per level).
//! - The status record is `#[repr(C)]` and `bytemuck::Pod`-safe.
//! - Every non-blocking operation is tracked in a `(peer, tag)` request map;
//!   posting a second request for a live slot first waits out the old one,
//!   and [`Communicator::cleanup`] drains everything outstanding.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

use crate::status::StatusMsg;
use crate::time_error::TimeSieveError;

/// Tag base for state payloads.
pub const DATA_TAG_BASE: u32 = 0x0100_0000;
/// Tag base for status records.
pub const STATUS_TAG_BASE: u32 = 0x0200_0000;
/// Tag base reserved for broadcasts (internal).
const BCAST_TAG_BASE: u32 = 0x0300_0000;

/// Tag for a state payload of `level` at sweep iteration `iter`.
#[inline]
pub fn data_tag(iter: usize, level: usize) -> u32 {
    DATA_TAG_BASE + ((iter as u32) << 8 | (level as u32 & 0xFF))
}

/// Tag for the status record at sweep iteration `iter`.
#[inline]
pub fn status_tag(iter: usize) -> u32 {
    STATUS_TAG_BASE + ((iter as u32) << 8)
}

/// Point-to-point communication over a linear chain of ranks.
///
/// Blocking operations complete before returning. Non-blocking sends stage a
/// copy of the payload inside the communicator; non-blocking receives post
/// into a staging buffer that a later blocking `recv` with the same
/// `(peer, tag)` completes and copies out.
pub trait Communicator: Send {
    /// Total number of ranks.
    fn size(&self) -> usize;
    /// Rank of this process (0..size-1).
    fn rank(&self) -> usize;
    /// True for the leftmost rank of the time chain.
    fn is_first(&self) -> bool {
        self.rank() == 0
    }
    /// True for the rightmost rank of the time chain.
    fn is_last(&self) -> bool {
        self.rank() + 1 == self.size()
    }

    /// Blocking send of a state payload.
    fn send(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError>;
    /// Blocking receive of a state payload.
    fn recv(&mut self, data: &mut [f64], src: usize, tag: u32) -> Result<(), TimeSieveError>;
    /// Non-blocking send; the payload is copied into an owned buffer.
    fn isend(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError>;
    /// Post a receive of `count` values from `src`; completed by a matching
    /// `recv` or dropped by `cleanup`.
    fn irecv(&mut self, count: usize, src: usize, tag: u32) -> Result<(), TimeSieveError>;
    /// Broadcast `data` from `root` to every rank.
    fn bcast(&mut self, data: &mut [f64], root: usize) -> Result<(), TimeSieveError>;
    /// Check for a matching in-flight message without receiving it.
    fn probe(&self, src: usize, tag: u32) -> bool;

    /// Blocking send of the packed status record.
    fn send_status(&mut self, status: &StatusMsg, dest: usize, tag: u32)
        -> Result<(), TimeSieveError>;
    /// Blocking receive of the packed status record.
    fn recv_status(
        &mut self,
        status: &mut StatusMsg,
        src: usize,
        tag: u32,
    ) -> Result<(), TimeSieveError>;
    /// Non-blocking send of the packed status record.
    fn isend_status(
        &mut self,
        status: &StatusMsg,
        dest: usize,
        tag: u32,
    ) -> Result<(), TimeSieveError>;
    /// Post a receive of a status record from `src`.
    fn irecv_status(&mut self, src: usize, tag: u32) -> Result<(), TimeSieveError>;

    /// Number of posted requests not yet completed or drained.
    fn pending_requests(&self) -> usize;
    /// Wait out or drop every outstanding request.
    fn cleanup(&mut self) -> Result<(), TimeSieveError>;
    /// Tear down the job after an unrecoverable transport error.
    fn abort(&mut self, code: i32) -> !;
}

/// Compile-time no-op comm for pure serial runs and unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn size(&self) -> usize {
        1
    }
    fn rank(&self) -> usize {
        0
    }

    fn send(&mut self, _data: &[f64], dest: usize, _tag: u32) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::TransportFailure(format!(
            "NoComm has no peer rank {dest}"
        )))
    }
    fn recv(&mut self, _data: &mut [f64], src: usize, _tag: u32) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::TransportFailure(format!(
            "NoComm has no peer rank {src}"
        )))
    }
    fn isend(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError> {
        self.send(data, dest, tag)
    }
    fn irecv(&mut self, _count: usize, src: usize, _tag: u32) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::TransportFailure(format!(
            "NoComm has no peer rank {src}"
        )))
    }
    fn bcast(&mut self, _data: &mut [f64], _root: usize) -> Result<(), TimeSieveError> {
        Ok(())
    }
    fn probe(&self, _src: usize, _tag: u32) -> bool {
        false
    }

    fn send_status(
        &mut self,
        _status: &StatusMsg,
        dest: usize,
        _tag: u32,
    ) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::TransportFailure(format!(
            "NoComm has no peer rank {dest}"
        )))
    }
    fn recv_status(
        &mut self,
        _status: &mut StatusMsg,
        src: usize,
        _tag: u32,
    ) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::TransportFailure(format!(
            "NoComm has no peer rank {src}"
        )))
    }
    fn isend_status(
        &mut self,
        status: &StatusMsg,
        dest: usize,
        tag: u32,
    ) -> Result<(), TimeSieveError> {
        self.send_status(status, dest, tag)
    }
    fn irecv_status(&mut self, src: usize, _tag: u32) -> Result<(), TimeSieveError> {
        Err(TimeSieveError::TransportFailure(format!(
            "NoComm has no peer rank {src}"
        )))
    }

    fn pending_requests(&self) -> usize {
        0
    }
    fn cleanup(&mut self) -> Result<(), TimeSieveError> {
        Ok(())
    }
    fn abort(&mut self, code: i32) -> ! {
        log::error!("NoComm abort with code {code}");
        std::process::exit(code)
    }
}

// --- ThreadComm: intra-process ranks over a shared mailbox ---

type MailKey = (usize, usize, u32); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    queues: Mutex<HashMap<MailKey, VecDeque<Vec<u8>>>>,
    cv: Condvar,
}

/// A set of in-process ranks sharing one mailbox. Create the group once,
/// then hand a [`ThreadGroup::comm`] to each rank thread.
#[derive(Clone)]
pub struct ThreadGroup {
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl ThreadGroup {
    pub fn new(size: usize) -> Self {
        ThreadGroup {
            size,
            mailbox: Arc::new(Mailbox::default()),
        }
    }

    /// The communicator endpoint for `rank`.
    pub fn comm(&self, rank: usize) -> ThreadComm {
        assert!(rank < self.size, "rank {rank} out of range");
        ThreadComm {
            rank,
            size: self.size,
            mailbox: Arc::clone(&self.mailbox),
            staged: HashMap::new(),
            posted: HashMap::new(),
            bcast_seq: 0,
        }
    }
}

/// In-process communicator endpoint; one per rank thread.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
    /// Completed early-receives keyed by `(peer, tag)`.
    staged: HashMap<(usize, u32), Vec<u8>>,
    /// Posted but not yet completed receives, with expected byte length.
    posted: HashMap<(usize, u32), usize>,
    bcast_seq: u32,
}

impl ThreadComm {
    fn push(&self, dst: usize, tag: u32, bytes: Vec<u8>) {
        let mut q = self.mailbox.queues.lock().expect("mailbox poisoned");
        q.entry((self.rank, dst, tag)).or_default().push_back(bytes);
        self.mailbox.cv.notify_all();
    }

    fn try_pop(&self, src: usize, tag: u32) -> Option<Vec<u8>> {
        let mut q = self.mailbox.queues.lock().expect("mailbox poisoned");
        q.get_mut(&(src, self.rank, tag)).and_then(|v| v.pop_front())
    }

    fn pop_blocking(&self, src: usize, tag: u32) -> Vec<u8> {
        let key = (src, self.rank, tag);
        let mut q = self.mailbox.queues.lock().expect("mailbox poisoned");
        loop {
            if let Some(bytes) = q.get_mut(&key).and_then(|v| v.pop_front()) {
                return bytes;
            }
            q = self.mailbox.cv.wait(q).expect("mailbox poisoned");
        }
    }

    fn recv_bytes(&mut self, len: usize, src: usize, tag: u32) -> Result<Vec<u8>, TimeSieveError> {
        let key = (src, tag);
        self.posted.remove(&key);
        let bytes = match self.staged.remove(&key) {
            Some(bytes) => bytes,
            None => self.pop_blocking(src, tag),
        };
        if bytes.len() != len {
            return Err(TimeSieveError::TransportFailure(format!(
                "message from rank {src} tag {tag:#x} has {} bytes, expected {len}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    fn post_recv(&mut self, len: usize, src: usize, tag: u32) {
        let key = (src, tag);
        if self.staged.contains_key(&key) || self.posted.contains_key(&key) {
            log::warn!(
                "request handle already exists for tag {tag:#x} and source {src} which is still active"
            );
            return;
        }
        match self.try_pop(src, tag) {
            Some(bytes) => {
                self.staged.insert(key, bytes);
            }
            None => {
                self.posted.insert(key, len);
            }
        }
    }
}

fn decode_f64(data: &mut [f64], bytes: &[u8]) {
    for (d, chunk) in data.iter_mut().zip(bytes.chunks_exact(8)) {
        *d = f64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
    }
}

impl Communicator for ThreadComm {
    fn size(&self) -> usize {
        self.size
    }
    fn rank(&self) -> usize {
        self.rank
    }

    fn send(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError> {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(dest, tag, bytes);
        Ok(())
    }

    fn recv(&mut self, data: &mut [f64], src: usize, tag: u32) -> Result<(), TimeSieveError> {
        let bytes = self.recv_bytes(data.len() * 8, src, tag)?;
        decode_f64(data, &bytes);
        Ok(())
    }

    fn isend(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError> {
        // The mailbox owns the copy, so local sends complete immediately.
        self.send(data, dest, tag)
    }

    fn irecv(&mut self, count: usize, src: usize, tag: u32) -> Result<(), TimeSieveError> {
        self.post_recv(count * 8, src, tag);
        Ok(())
    }

    fn bcast(&mut self, data: &mut [f64], root: usize) -> Result<(), TimeSieveError> {
        let tag = BCAST_TAG_BASE + self.bcast_seq;
        self.bcast_seq += 1;
        if self.rank == root {
            for peer in (0..self.size).filter(|&p| p != root) {
                let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
                self.push(peer, tag, bytes);
            }
            Ok(())
        } else {
            let bytes = self.recv_bytes(data.len() * 8, root, tag)?;
            decode_f64(data, &bytes);
            Ok(())
        }
    }

    fn probe(&self, src: usize, tag: u32) -> bool {
        if self.staged.contains_key(&(src, tag)) {
            return true;
        }
        let q = self.mailbox.queues.lock().expect("mailbox poisoned");
        q.get(&(src, self.rank, tag)).is_some_and(|v| !v.is_empty())
    }

    fn send_status(
        &mut self,
        status: &StatusMsg,
        dest: usize,
        tag: u32,
    ) -> Result<(), TimeSieveError> {
        self.push(dest, tag, bytemuck::bytes_of(status).to_vec());
        Ok(())
    }

    fn recv_status(
        &mut self,
        status: &mut StatusMsg,
        src: usize,
        tag: u32,
    ) -> Result<(), TimeSieveError> {
        let bytes = self.recv_bytes(std::mem::size_of::<StatusMsg>(), src, tag)?;
        *status = bytemuck::pod_read_unaligned(&bytes);
        Ok(())
    }

    fn isend_status(
        &mut self,
        status: &StatusMsg,
        dest: usize,
        tag: u32,
    ) -> Result<(), TimeSieveError> {
        self.send_status(status, dest, tag)
    }

    fn irecv_status(&mut self, src: usize, tag: u32) -> Result<(), TimeSieveError> {
        self.post_recv(std::mem::size_of::<StatusMsg>(), src, tag);
        Ok(())
    }

    fn pending_requests(&self) -> usize {
        self.posted.len()
    }

    fn cleanup(&mut self) -> Result<(), TimeSieveError> {
        // Complete what already arrived; a post whose message never comes is
        // dropped rather than waited, since the sender may have terminated.
        let keys: Vec<_> = self.posted.keys().copied().collect();
        for (src, tag) in keys {
            let _ = self.try_pop(src, tag);
        }
        self.posted.clear();
        self.staged.clear();
        Ok(())
    }

    fn abort(&mut self, code: i32) -> ! {
        log::error!("ThreadComm rank {} abort with code {code}", self.rank);
        std::process::abort()
    }
}

/// Run one closure per rank on a dedicated thread pool and collect the
/// results in rank order. The closures block on each other through their
/// communicators, so the pool always holds `size` threads.
pub fn run_with_threads<R, F>(size: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(ThreadComm) -> R + Sync,
{
    let group = ThreadGroup::new(size);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(size)
        .build()
        .expect("rank thread pool");
    let mut results: Vec<Option<R>> = (0..size).map(|_| None).collect();
    pool.scope(|s| {
        for (rank, slot) in results.iter_mut().enumerate() {
            let comm = group.comm(rank);
            let f = &f;
            s.spawn(move |_| {
                *slot = Some(f(comm));
            });
        }
    });
    results
        .into_iter()
        .map(|r| r.expect("rank closure completed"))
        .collect()
}

// --- MPI backend ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use core::ptr::NonNull;
    use mpi::collective::Root;
    use mpi::environment::Universe;
    use mpi::point_to_point::{Destination, Source};
    use mpi::request::StaticScope;
    use mpi::topology::{Communicator as _, SimpleCommunicator};

    type ByteRequest = mpi::request::Request<'static, [u8], StaticScope>;

    struct Pending {
        req: Option<ByteRequest>,
        buf: Option<NonNull<[u8]>>,
        is_recv: bool,
    }

    /// MPI point-to-point communicator over the world chain of ranks.
    pub struct MpiComm {
        _universe: Universe,
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        requests: HashMap<(usize, u32), Pending>,
    }

    unsafe impl Send for MpiComm {}

    impl MpiComm {
        /// Initialize MPI and wrap the world communicator.
        pub fn new() -> Self {
            let universe = mpi::initialize().expect("MPI already initialized");
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            MpiComm {
                _universe: universe,
                world,
                rank,
                size,
                requests: HashMap::new(),
            }
        }

        fn wait_out(entry: Pending) -> Option<Vec<u8>> {
            if let Some(req) = entry.req {
                let _ = req.wait();
            }
            let bytes = entry.buf.map(|ptr| {
                let boxed: Box<[u8]> = unsafe { Box::from_raw(ptr.as_ptr()) };
                Vec::from(boxed)
            });
            if entry.is_recv {
                bytes
            } else {
                None
            }
        }

        /// A prior request on `(peer, tag)` must finish before its slot is
        /// reused.
        fn retire_slot(&mut self, peer: usize, tag: u32) {
            if let Some(prior) = self.requests.remove(&(peer, tag)) {
                log::warn!(
                    "request handle already exists for tag {tag:#x} and peer {peer} which is still active"
                );
                let _ = Self::wait_out(prior);
            }
        }

        fn isend_bytes(&mut self, bytes: &[u8], dest: usize, tag: u32) {
            self.retire_slot(dest, tag);
            let boxed = bytes.to_vec().into_boxed_slice();
            let raw: *mut [u8] = Box::into_raw(boxed);
            let slice: &[u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(dest as i32)
                .immediate_send_with_tag(StaticScope, slice, tag as i32);
            self.requests.insert(
                (dest, tag),
                Pending {
                    req: Some(req),
                    buf: Some(unsafe { NonNull::new_unchecked(raw) }),
                    is_recv: false,
                },
            );
        }

        fn irecv_bytes(&mut self, len: usize, src: usize, tag: u32) {
            self.retire_slot(src, tag);
            let boxed = vec![0u8; len].into_boxed_slice();
            let raw: *mut [u8] = Box::into_raw(boxed);
            let slice: &mut [u8] = unsafe { &mut *raw };
            let req = self
                .world
                .process_at_rank(src as i32)
                .immediate_receive_into_with_tag(StaticScope, slice, tag as i32);
            self.requests.insert(
                (src, tag),
                Pending {
                    req: Some(req),
                    buf: Some(unsafe { NonNull::new_unchecked(raw) }),
                    is_recv: true,
                },
            );
        }

        /// Complete a posted receive if one exists for `(src, tag)`.
        fn take_posted(&mut self, src: usize, tag: u32) -> Option<Vec<u8>> {
            let entry = self.requests.remove(&(src, tag))?;
            if entry.is_recv {
                Self::wait_out(entry)
            } else {
                // A send lives in this slot; wait it out and fall through to
                // a fresh blocking receive.
                let _ = Self::wait_out(entry);
                None
            }
        }
    }

    impl Default for MpiComm {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Communicator for MpiComm {
        fn size(&self) -> usize {
            self.size
        }
        fn rank(&self) -> usize {
            self.rank
        }

        fn send(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError> {
            let bytes: &[u8] = bytemuck::cast_slice(data);
            self.world
                .process_at_rank(dest as i32)
                .send_with_tag(bytes, tag as i32);
            Ok(())
        }

        fn recv(&mut self, data: &mut [f64], src: usize, tag: u32) -> Result<(), TimeSieveError> {
            let bytes = match self.take_posted(src, tag) {
                Some(bytes) => bytes,
                None => {
                    let mut buf = vec![0u8; data.len() * 8];
                    self.world
                        .process_at_rank(src as i32)
                        .receive_into_with_tag(&mut buf[..], tag as i32);
                    buf
                }
            };
            if bytes.len() != data.len() * 8 {
                return Err(TimeSieveError::TransportFailure(format!(
                    "message from rank {src} tag {tag:#x} has {} bytes, expected {}",
                    bytes.len(),
                    data.len() * 8
                )));
            }
            decode_f64(data, &bytes);
            Ok(())
        }

        fn isend(&mut self, data: &[f64], dest: usize, tag: u32) -> Result<(), TimeSieveError> {
            self.isend_bytes(bytemuck::cast_slice(data), dest, tag);
            Ok(())
        }

        fn irecv(&mut self, count: usize, src: usize, tag: u32) -> Result<(), TimeSieveError> {
            self.irecv_bytes(count * 8, src, tag);
            Ok(())
        }

        fn bcast(&mut self, data: &mut [f64], root: usize) -> Result<(), TimeSieveError> {
            self.world
                .process_at_rank(root as i32)
                .broadcast_into(&mut data[..]);
            Ok(())
        }

        fn probe(&self, src: usize, tag: u32) -> bool {
            self.world
                .process_at_rank(src as i32)
                .immediate_probe_with_tag(tag as i32)
                .is_some()
        }

        fn send_status(
            &mut self,
            status: &StatusMsg,
            dest: usize,
            tag: u32,
        ) -> Result<(), TimeSieveError> {
            self.world
                .process_at_rank(dest as i32)
                .send_with_tag(bytemuck::bytes_of(status), tag as i32);
            Ok(())
        }

        fn recv_status(
            &mut self,
            status: &mut StatusMsg,
            src: usize,
            tag: u32,
        ) -> Result<(), TimeSieveError> {
            let bytes = match self.take_posted(src, tag) {
                Some(bytes) => bytes,
                None => {
                    let mut buf = vec![0u8; std::mem::size_of::<StatusMsg>()];
                    self.world
                        .process_at_rank(src as i32)
                        .receive_into_with_tag(&mut buf[..], tag as i32);
                    buf
                }
            };
            *status = bytemuck::pod_read_unaligned(&bytes);
            Ok(())
        }

        fn isend_status(
            &mut self,
            status: &StatusMsg,
            dest: usize,
            tag: u32,
        ) -> Result<(), TimeSieveError> {
            self.isend_bytes(bytemuck::bytes_of(status), dest, tag);
            Ok(())
        }

        fn irecv_status(&mut self, src: usize, tag: u32) -> Result<(), TimeSieveError> {
            self.irecv_bytes(std::mem::size_of::<StatusMsg>(), src, tag);
            Ok(())
        }

        fn pending_requests(&self) -> usize {
            self.requests.len()
        }

        fn cleanup(&mut self) -> Result<(), TimeSieveError> {
            for (_, entry) in self.requests.drain() {
                let _ = Self::wait_out(entry);
            }
            Ok(())
        }

        fn abort(&mut self, code: i32) -> ! {
            self.world.abort(code)
        }
    }

    impl Drop for MpiComm {
        fn drop(&mut self) {
            let _ = self.cleanup();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_disjoint() {
        assert_ne!(data_tag(3, 1), status_tag(3));
        assert_ne!(data_tag(0, 0), status_tag(0));
        assert_eq!(data_tag(2, 1), DATA_TAG_BASE + (2 << 8 | 1));
    }

    #[test]
    fn thread_comm_round_trip() {
        let group = ThreadGroup::new(2);
        let mut c0 = group.comm(0);
        let mut c1 = group.comm(1);

        c0.send(&[1.0, 2.5, -3.0], 1, data_tag(0, 0)).unwrap();
        let mut buf = [0.0; 3];
        c1.recv(&mut buf, 0, data_tag(0, 0)).unwrap();
        assert_eq!(buf, [1.0, 2.5, -3.0]);
    }

    #[test]
    fn thread_comm_fifo_order() {
        let group = ThreadGroup::new(2);
        let mut c0 = group.comm(0);
        let mut c1 = group.comm(1);

        for i in 0..10 {
            c0.isend(&[i as f64], 1, 7).unwrap();
        }
        for i in 0..10 {
            let mut b = [0.0];
            c1.recv(&mut b, 0, 7).unwrap();
            assert_eq!(b[0], i as f64);
        }
    }

    #[test]
    fn length_mismatch_is_transport_failure() {
        let group = ThreadGroup::new(2);
        let mut c0 = group.comm(0);
        let mut c1 = group.comm(1);

        c0.send(&[1.0, 2.0], 1, 9).unwrap();
        let mut buf = [0.0; 3];
        assert!(matches!(
            c1.recv(&mut buf, 0, 9),
            Err(TimeSieveError::TransportFailure(_))
        ));
    }

    #[test]
    fn probe_and_staged_irecv() {
        let group = ThreadGroup::new(2);
        let mut c0 = group.comm(0);
        let mut c1 = group.comm(1);

        assert!(!c1.probe(0, 11));
        c0.send(&[4.0], 1, 11).unwrap();
        assert!(c1.probe(0, 11));

        // irecv completes eagerly when the message already arrived.
        c1.irecv(1, 0, 11).unwrap();
        assert_eq!(c1.pending_requests(), 0);
        let mut b = [0.0];
        c1.recv(&mut b, 0, 11).unwrap();
        assert_eq!(b[0], 4.0);
    }

    #[test]
    fn cleanup_empties_pending_map() {
        let group = ThreadGroup::new(2);
        let mut c1 = group.comm(1);
        c1.irecv(4, 0, 21).unwrap();
        c1.irecv_status(0, status_tag(1)).unwrap();
        assert_eq!(c1.pending_requests(), 2);
        c1.cleanup().unwrap();
        assert_eq!(c1.pending_requests(), 0);
    }

    #[test]
    fn status_round_trip() {
        let group = ThreadGroup::new(2);
        let mut c0 = group.comm(0);
        let mut c1 = group.comm(1);

        let msg = StatusMsg {
            time: 0.5,
            dt: 0.1,
            abs_res_norm: 1e-8,
            rel_res_norm: 1e-9,
            iteration: 4,
            flags: crate::status::FLAG_CONVERGED,
        };
        c0.send_status(&msg, 1, status_tag(4)).unwrap();
        let mut got = StatusMsg::default();
        c1.recv_status(&mut got, 0, status_tag(4)).unwrap();
        assert_eq!(got, msg);
        assert!(got.converged());
    }

    #[test]
    fn bcast_across_threads() {
        let results = run_with_threads(3, |mut comm| {
            let mut data = if comm.rank() == 1 { [3.25, -1.0] } else { [0.0, 0.0] };
            comm.bcast(&mut data, 1).unwrap();
            data
        });
        for r in results {
            assert_eq!(r, [3.25, -1.0]);
        }
    }
}
