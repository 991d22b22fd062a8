//! Cross-thread behavior of the in-process communicator.

mod util;

use time_sieve::comm::{data_tag, run_with_threads, status_tag, Communicator, ThreadGroup};
use time_sieve::status::StatusMsg;

#[test]
fn blocking_recv_waits_for_a_cross_thread_send() {
    util::init_logs();
    let results = run_with_threads(2, |mut comm| {
        if comm.rank() == 0 {
            // Give the receiver a head start so it actually blocks.
            std::thread::sleep(std::time::Duration::from_millis(20));
            comm.send(&[42.0, -7.0], 1, data_tag(1, 0)).unwrap();
            Vec::new()
        } else {
            let mut buf = [0.0; 2];
            comm.recv(&mut buf, 0, data_tag(1, 0)).unwrap();
            buf.to_vec()
        }
    });
    assert_eq!(results[1], vec![42.0, -7.0]);
}

#[test]
fn ring_of_ranks_passes_a_token() {
    util::init_logs();
    let size = 4;
    let results = run_with_threads(size, move |mut comm| {
        let rank = comm.rank();
        let mut token = [rank as f64];
        if rank > 0 {
            comm.recv(&mut token, rank - 1, 5).unwrap();
            token[0] += 1.0;
        }
        if rank + 1 < size {
            comm.send(&token, rank + 1, 5).unwrap();
        }
        token[0]
    });
    assert_eq!(results, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn status_pipeline_is_ordered_by_iteration() {
    util::init_logs();
    let results = run_with_threads(2, |mut comm| {
        if comm.rank() == 0 {
            for k in 1..=3 {
                let msg = StatusMsg {
                    iteration: k as u32,
                    ..Default::default()
                };
                comm.isend_status(&msg, 1, status_tag(k)).unwrap();
            }
            Vec::new()
        } else {
            (1..=3)
                .map(|k| {
                    let mut msg = StatusMsg::default();
                    comm.recv_status(&mut msg, 0, status_tag(k)).unwrap();
                    msg.iteration
                })
                .collect()
        }
    });
    assert_eq!(results[1], vec![1, 2, 3]);
}

#[test]
fn cleanup_leaves_no_outstanding_requests() {
    let group = ThreadGroup::new(2);
    let mut c0 = group.comm(0);
    let mut c1 = group.comm(1);

    // A posted receive whose message never arrives, one that did, and a
    // completed send.
    c1.irecv(3, 0, data_tag(7, 0)).unwrap();
    c0.isend(&[1.0], 1, data_tag(8, 0)).unwrap();
    c1.irecv(1, 0, data_tag(8, 0)).unwrap();
    assert!(c1.pending_requests() > 0);

    c1.cleanup().unwrap();
    c0.cleanup().unwrap();
    assert_eq!(c1.pending_requests(), 0);
    assert_eq!(c0.pending_requests(), 0);
}

#[test]
fn reposting_a_live_request_slot_is_tolerated() {
    util::init_logs();
    let group = ThreadGroup::new(2);
    let mut c1 = group.comm(1);
    c1.irecv(1, 0, 3).unwrap();
    // Same (peer, tag) again: the slot is already tracked.
    c1.irecv(1, 0, 3).unwrap();
    assert_eq!(c1.pending_requests(), 1);
    c1.cleanup().unwrap();
    assert_eq!(c1.pending_requests(), 0);
}
