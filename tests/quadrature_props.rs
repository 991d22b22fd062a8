use proptest::prelude::*;
use time_sieve::prelude::*;

const KINDS: [QuadKind; 5] = [
    QuadKind::GaussLobatto,
    QuadKind::GaussLegendre,
    QuadKind::GaussRadau,
    QuadKind::ClenshawCurtis,
    QuadKind::Uniform,
];

fn min_nodes(kind: QuadKind) -> usize {
    match kind {
        QuadKind::GaussLegendre | QuadKind::GaussRadau => 1,
        _ => 2,
    }
}

#[test]
fn end_weights_sum_to_one() {
    for kind in KINDS {
        for m in min_nodes(kind)..=8 {
            let q = Quadrature::new(kind, m).unwrap();
            let sum: f64 = q.b_vec().iter().sum();
            assert!((sum - 1.0).abs() < 1e-11, "{kind} M={m}: sum = {sum}");
        }
    }
}

#[test]
fn nodes_are_sorted_in_unit_interval() {
    for kind in KINDS {
        for m in min_nodes(kind)..=8 {
            let q = Quadrature::new(kind, m).unwrap();
            let nodes = q.nodes();
            for w in nodes.windows(2) {
                assert!(w[0] < w[1], "{kind} M={m}: nodes not ascending");
            }
            assert!(nodes[0] >= -1e-14 && nodes[m - 1] <= 1.0 + 1e-14);
        }
    }
}

#[test]
fn cumulative_rows_integrate_the_constant() {
    // Row sums of q_mat are the integrals of 1 from 0 to each node, so they
    // must reproduce the nodes themselves and grow monotonically.
    for kind in KINDS {
        for m in min_nodes(kind)..=6 {
            let q = Quadrature::new(kind, m).unwrap();
            let mut prev = 0.0;
            for (row, &node) in q.q_mat().iter().zip(q.nodes()) {
                let sum: f64 = row.iter().sum();
                assert!((sum - node).abs() < 1e-11, "{kind} M={m}");
                assert!(sum >= prev - 1e-12, "{kind} M={m}: rows not monotone");
                prev = sum;
            }
        }
    }
}

#[test]
fn final_row_matches_end_weights_when_right_is_node() {
    for kind in KINDS {
        let q = Quadrature::new(kind, 5).unwrap();
        if !q.right_is_node() {
            continue;
        }
        let last = &q.q_mat()[4];
        for (a, b) in last.iter().zip(q.b_vec()) {
            assert!((a - b).abs() < 1e-11, "{kind}");
        }
    }
}

#[test]
fn s_rows_accumulate_to_q_rows() {
    for kind in KINDS {
        let q = Quadrature::new(kind, 5).unwrap();
        let mut acc = vec![0.0; 6];
        for (s_row, q_row) in q.s_mat().iter().zip(q.q_mat()) {
            for (a, s) in acc.iter_mut().zip(s_row) {
                *a += s;
            }
            for (a, b) in acc.iter().zip(q_row) {
                assert!((a - b).abs() < 1e-12, "{kind}");
            }
        }
    }
}

proptest! {
    #[test]
    fn weights_are_consistent_for_any_rule(kind_idx in 0usize..5, m in 2usize..8) {
        let kind = KINDS[kind_idx];
        let q = Quadrature::new(kind, m).unwrap();
        let b_sum: f64 = q.b_vec().iter().sum();
        prop_assert!((b_sum - 1.0).abs() < 1e-10);
        for (row, &node) in q.q_mat().iter().zip(q.nodes()) {
            let sum: f64 = row.iter().sum();
            prop_assert!((sum - node).abs() < 1e-10);
        }
    }
}
