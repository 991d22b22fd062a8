//! Collocation quadrature: node families on [0, 1] and the integration
//! matrices the sweepers consume.
//!
//! A rule with `M` nodes carries three weight sets over the *augmented* node
//! set (the left interval boundary prefixed to the nodes):
//! - `q_mat` (M x (M+1)): row `m` integrates the Lagrange basis from 0 to
//!   `nodes[m]`,
//! - `s_mat` (M x (M+1)): row differences of `q_mat`, i.e. node-to-node
//!   sub-interval weights,
//! - `b_vec` (M+1): end-interval weights over the whole of [0, 1].
//!
//! When the left boundary itself is a node the prefix slot would duplicate
//! it, so its basis column is identically zero and all weight sits on the
//! node columns.

pub mod polynomial;

use crate::time_error::TimeSieveError;
use polynomial::{integrate_to, isolate_roots, lagrange_coeffs, legendre, legendre_deriv};

const NODE_EPS: f64 = 1e-12;

/// Collocation node family.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QuadKind {
    /// Gauss-Lobatto nodes; both interval boundaries are nodes.
    GaussLobatto,
    /// Gauss-Legendre nodes; neither boundary is a node.
    GaussLegendre,
    /// Right-hand Gauss-Radau nodes; the right boundary is a node.
    GaussRadau,
    /// Clenshaw-Curtis (cosine-spaced) nodes; both boundaries are nodes.
    ClenshawCurtis,
    /// Equidistant nodes; both boundaries are nodes.
    Uniform,
}

impl QuadKind {
    fn min_nodes(self) -> usize {
        match self {
            QuadKind::GaussLegendre | QuadKind::GaussRadau => 1,
            _ => 2,
        }
    }
}

impl std::fmt::Display for QuadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuadKind::GaussLobatto => "Gauss-Lobatto",
            QuadKind::GaussLegendre => "Gauss-Legendre",
            QuadKind::GaussRadau => "Gauss-Radau",
            QuadKind::ClenshawCurtis => "Clenshaw-Curtis",
            QuadKind::Uniform => "uniform",
        };
        f.write_str(name)
    }
}

/// A collocation rule: nodes on [0, 1] plus the Q/S/B integration weights.
#[derive(Clone, Debug)]
pub struct Quadrature {
    kind: QuadKind,
    nodes: Vec<f64>,
    q_mat: Vec<Vec<f64>>,
    s_mat: Vec<Vec<f64>>,
    b_vec: Vec<f64>,
}

impl Quadrature {
    /// Build the rule for `kind` with `num_nodes` collocation nodes.
    pub fn new(kind: QuadKind, num_nodes: usize) -> Result<Self, TimeSieveError> {
        if num_nodes < kind.min_nodes() {
            return Err(TimeSieveError::InvalidNodeCount {
                min: kind.min_nodes(),
                got: num_nodes,
            });
        }
        let nodes = compute_nodes(kind, num_nodes);
        let left_is_node = nodes[0].abs() < NODE_EPS;

        // Lagrange basis over the augmented set. A left-boundary node would
        // duplicate the prefix point, so the basis then spans the nodes only
        // and the prefix column stays zero.
        let (basis, offset): (Vec<f64>, usize) = if left_is_node {
            (nodes.clone(), 1)
        } else {
            let mut b = Vec::with_capacity(num_nodes + 1);
            b.push(0.0);
            b.extend_from_slice(&nodes);
            (b, 0)
        };

        let mut q_mat = vec![vec![0.0; num_nodes + 1]; num_nodes];
        let mut b_vec = vec![0.0; num_nodes + 1];
        for (jb, _) in basis.iter().enumerate() {
            let coeffs = lagrange_coeffs(&basis, jb);
            for (m, row) in q_mat.iter_mut().enumerate() {
                row[jb + offset] = integrate_to(&coeffs, nodes[m]);
            }
            b_vec[jb + offset] = integrate_to(&coeffs, 1.0);
        }

        let mut s_mat = q_mat.clone();
        for m in (1..num_nodes).rev() {
            for j in 0..=num_nodes {
                s_mat[m][j] = q_mat[m][j] - q_mat[m - 1][j];
            }
        }

        Ok(Quadrature {
            kind,
            nodes,
            q_mat,
            s_mat,
            b_vec,
        })
    }

    /// The node family this rule was built from.
    #[inline]
    pub fn kind(&self) -> QuadKind {
        self.kind
    }

    /// Collocation nodes, ascending in [0, 1].
    #[inline]
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    /// Number of collocation nodes `M`.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Node times prefixed with the left interval boundary; length `M + 1`,
    /// aligned with the sweeper's state arrays.
    pub fn augmented_nodes(&self) -> Vec<f64> {
        let mut aug = Vec::with_capacity(self.nodes.len() + 1);
        aug.push(0.0);
        aug.extend_from_slice(&self.nodes);
        aug
    }

    /// True iff the left interval boundary is itself a node.
    #[inline]
    pub fn left_is_node(&self) -> bool {
        self.nodes[0].abs() < NODE_EPS
    }

    /// True iff the right interval boundary is itself a node.
    #[inline]
    pub fn right_is_node(&self) -> bool {
        (self.nodes[self.nodes.len() - 1] - 1.0).abs() < NODE_EPS
    }

    /// Cumulative integration weights; row `m` integrates from 0 to
    /// `nodes[m]` over the augmented node set.
    #[inline]
    pub fn q_mat(&self) -> &[Vec<f64>] {
        &self.q_mat
    }

    /// Node-to-node sub-interval weights; row `m` integrates from
    /// `nodes[m-1]` (or 0) to `nodes[m]`.
    #[inline]
    pub fn s_mat(&self) -> &[Vec<f64>] {
        &self.s_mat
    }

    /// End-interval weights over [0, 1], length `M + 1`.
    #[inline]
    pub fn b_vec(&self) -> &[f64] {
        &self.b_vec
    }

    /// Asymptotic order of the collocation rule, for reporting and test
    /// contracts only.
    pub fn expected_order(&self) -> usize {
        let m = self.num_nodes();
        match self.kind {
            QuadKind::GaussLobatto => 2 * m - 2,
            QuadKind::GaussLegendre => 2 * m,
            QuadKind::GaussRadau => 2 * m - 1,
            QuadKind::ClenshawCurtis | QuadKind::Uniform => m,
        }
    }

    /// Distinct Lagrange basis points and the state-array index of the first
    /// one. Used by the polynomial time transfer between levels.
    pub(crate) fn basis_points(&self) -> (Vec<f64>, usize) {
        if self.left_is_node() {
            (self.nodes.clone(), 1)
        } else {
            let mut b = Vec::with_capacity(self.nodes.len() + 1);
            b.push(0.0);
            b.extend_from_slice(&self.nodes);
            (b, 0)
        }
    }
}

fn compute_nodes(kind: QuadKind, m: usize) -> Vec<f64> {
    let map = |x: f64| 0.5 * (1.0 + x);
    match kind {
        QuadKind::GaussLobatto => {
            let mut nodes = Vec::with_capacity(m);
            nodes.push(0.0);
            if m > 2 {
                let interior = isolate_roots(|x| legendre_deriv(m - 1, x), -1.0, 1.0, m - 2);
                nodes.extend(interior.into_iter().map(map));
            }
            nodes.push(1.0);
            nodes
        }
        QuadKind::GaussLegendre => isolate_roots(|x| legendre(m, x), -1.0, 1.0, m)
            .into_iter()
            .map(map)
            .collect(),
        QuadKind::GaussRadau => {
            // Left-Radau abscissae are -1 plus the roots of P_{m-1} + P_m on
            // (-1, 1); reflecting them yields the right-Radau set.
            let mut xs: Vec<f64> = if m > 1 {
                isolate_roots(|x| legendre(m - 1, x) + legendre(m, x), -1.0, 1.0, m - 1)
                    .into_iter()
                    .map(|x| -x)
                    .collect()
            } else {
                Vec::new()
            };
            xs.push(1.0);
            xs.sort_by(f64::total_cmp);
            xs.into_iter().map(map).collect()
        }
        QuadKind::ClenshawCurtis => (0..m)
            .map(|j| 0.5 * (1.0 - (std::f64::consts::PI * j as f64 / (m - 1) as f64).cos()))
            .collect(),
        QuadKind::Uniform => (0..m).map(|j| j as f64 / (m - 1) as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [QuadKind; 5] = [
        QuadKind::GaussLobatto,
        QuadKind::GaussLegendre,
        QuadKind::GaussRadau,
        QuadKind::ClenshawCurtis,
        QuadKind::Uniform,
    ];

    #[test]
    fn b_vec_sums_to_one() {
        for kind in KINDS {
            for m in kind.min_nodes()..=7 {
                let q = Quadrature::new(kind, m).unwrap();
                let sum: f64 = q.b_vec().iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-12,
                    "{kind} M={m}: b_vec sums to {sum}"
                );
            }
        }
    }

    #[test]
    fn q_row_sums_are_nodes() {
        // Integrating the constant 1 from 0 to a node must return the node.
        for kind in KINDS {
            for m in kind.min_nodes()..=6 {
                let q = Quadrature::new(kind, m).unwrap();
                for (row, &node) in q.q_mat().iter().zip(q.nodes()) {
                    let sum: f64 = row.iter().sum();
                    assert!((sum - node).abs() < 1e-12, "{kind} M={m}");
                }
            }
        }
    }

    #[test]
    fn last_q_row_equals_b_when_right_is_node() {
        for kind in [QuadKind::GaussLobatto, QuadKind::GaussRadau, QuadKind::Uniform] {
            let q = Quadrature::new(kind, 4).unwrap();
            assert!(q.right_is_node());
            for (a, b) in q.q_mat()[3].iter().zip(q.b_vec()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn lobatto_three_nodes() {
        let q = Quadrature::new(QuadKind::GaussLobatto, 3).unwrap();
        let expect = [0.0, 0.5, 1.0];
        for (n, e) in q.nodes().iter().zip(&expect) {
            assert!((n - e).abs() < 1e-14);
        }
        assert!(q.left_is_node() && q.right_is_node());
    }

    #[test]
    fn radau_two_nodes() {
        let q = Quadrature::new(QuadKind::GaussRadau, 2).unwrap();
        assert!((q.nodes()[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((q.nodes()[1] - 1.0).abs() < 1e-14);
        assert!(!q.left_is_node() && q.right_is_node());
    }

    #[test]
    fn legendre_two_nodes() {
        let q = Quadrature::new(QuadKind::GaussLegendre, 2).unwrap();
        let off = 0.5 / 3.0f64.sqrt();
        assert!((q.nodes()[0] - (0.5 - off)).abs() < 1e-13);
        assert!((q.nodes()[1] - (0.5 + off)).abs() < 1e-13);
        assert!(!q.left_is_node() && !q.right_is_node());
    }

    #[test]
    fn quadrature_is_exact_for_low_degree() {
        // A rule of order >= 3 integrates x^2 exactly from 0 to each node.
        let q = Quadrature::new(QuadKind::GaussLobatto, 3).unwrap();
        let aug = q.augmented_nodes();
        for (m, &node) in q.nodes().iter().enumerate() {
            let approx: f64 = q.q_mat()[m]
                .iter()
                .zip(&aug)
                .map(|(w, t)| w * t * t)
                .sum();
            assert!((approx - node.powi(3) / 3.0).abs() < 1e-13);
        }
    }

    #[test]
    fn too_few_nodes_is_an_error() {
        assert!(matches!(
            Quadrature::new(QuadKind::GaussLobatto, 1),
            Err(TimeSieveError::InvalidNodeCount { min: 2, got: 1 })
        ));
    }

    #[test]
    fn expected_orders() {
        assert_eq!(
            Quadrature::new(QuadKind::GaussLobatto, 3).unwrap().expected_order(),
            4
        );
        assert_eq!(
            Quadrature::new(QuadKind::GaussLegendre, 3).unwrap().expected_order(),
            6
        );
        assert_eq!(
            Quadrature::new(QuadKind::GaussRadau, 3).unwrap().expected_order(),
            5
        );
        assert_eq!(
            Quadrature::new(QuadKind::Uniform, 3).unwrap().expected_order(),
            3
        );
    }
}
