//! Condensation of a fracture-cell network onto matrix-to-well connections.
//!
//! Unknowns are fracture-cell pressures. With the well at zero pressure, the
//! flux from matrix cell `m` at unit pressure is `t_m · A⁻¹ · t_w`, where `A`
//! is the fracture conductance matrix, `t_m` the matrix couplings and `t_w`
//! the well couplings. `A` is symmetric, so one solve `A z = t_w` serves
//! every matrix cell.

use crate::numerics::linalg::{DenseMatrix, LuError, lu_solve};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FractureNetwork {
    pub node_count: usize,
    /// Node to node transmissibilities inside the fracture.
    pub internal_links: Vec<(usize, usize, f64)>,
    /// Node to external matrix cell transmissibilities.
    pub matrix_links: Vec<(usize, usize, f64)>,
    /// Node to well transmissibilities.
    pub well_links: Vec<(usize, f64)>,
}

impl FractureNetwork {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    /// Nodes connected to the well through positive fracture links.
    fn nodes_reaching_well(&self) -> Vec<usize> {
        let mut neighbours = vec![Vec::new(); self.node_count];
        for &(from, to, transmissibility) in &self.internal_links {
            if transmissibility > 0.0 && from < self.node_count && to < self.node_count {
                neighbours[from].push(to);
                neighbours[to].push(from);
            }
        }

        let mut reached = vec![false; self.node_count];
        let mut queue = VecDeque::new();
        for &(node, transmissibility) in &self.well_links {
            if transmissibility > 0.0 && node < self.node_count && !reached[node] {
                reached[node] = true;
                queue.push_back(node);
            }
        }
        while let Some(node) = queue.pop_front() {
            for &next in &neighbours[node] {
                if !reached[next] {
                    reached[next] = true;
                    queue.push_back(next);
                }
            }
        }
        (0..self.node_count).filter(|node| reached[*node]).collect()
    }
}

/// Matrix-to-well transmissibility per external cell, in first-seen order of
/// `matrix_links`. Cells only touching parts of the fracture that cannot
/// reach the well are left out.
pub fn condense_to_well(network: &FractureNetwork) -> Result<Vec<(usize, f64)>, LuError> {
    let nodes = network.nodes_reaching_well();
    if nodes.is_empty() {
        return Ok(Vec::new());
    }
    let rows: HashMap<usize, usize> = nodes
        .iter()
        .enumerate()
        .map(|(row, node)| (*node, row))
        .collect();

    let dimension = nodes.len();
    let mut matrix = DenseMatrix::zeros(dimension, dimension);
    let mut well_vector = vec![0.0; dimension];

    for &(from, to, transmissibility) in &network.internal_links {
        if let (Some(&a), Some(&b)) = (rows.get(&from), rows.get(&to)) {
            matrix[(a, a)] += transmissibility;
            matrix[(b, b)] += transmissibility;
            matrix[(a, b)] -= transmissibility;
            matrix[(b, a)] -= transmissibility;
        }
    }
    for &(node, _, transmissibility) in &network.matrix_links {
        if let Some(&row) = rows.get(&node) {
            matrix[(row, row)] += transmissibility;
        }
    }
    for &(node, transmissibility) in &network.well_links {
        if let Some(&row) = rows.get(&node) {
            matrix[(row, row)] += transmissibility;
            well_vector[row] += transmissibility;
        }
    }

    let potentials = lu_solve(&matrix, &well_vector)?;

    let mut order: Vec<usize> = Vec::new();
    let mut totals: HashMap<usize, f64> = HashMap::new();
    for &(node, external, transmissibility) in &network.matrix_links {
        let Some(&row) = rows.get(&node) else {
            continue;
        };
        let total = totals.entry(external).or_insert_with(|| {
            order.push(external);
            0.0
        });
        *total += transmissibility * potentials[row];
    }
    Ok(order
        .into_iter()
        .map(|external| (external, totals.get(&external).copied().unwrap_or(0.0)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{FractureNetwork, condense_to_well};

    #[test]
    fn single_node_is_series_connection() {
        let mut network = FractureNetwork::new(1);
        network.matrix_links.push((0, 42, 2.0));
        network.well_links.push((0, 2.0));

        let condensed = condense_to_well(&network).expect("condense");
        assert_eq!(condensed.len(), 1);
        assert_eq!(condensed[0].0, 42);
        assert!((condensed[0].1 - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn chain_adds_fracture_resistance() {
        let mut network = FractureNetwork::new(2);
        network.internal_links.push((0, 1, 1.0));
        network.well_links.push((0, 1.0));
        network.matrix_links.push((1, 7, 1.0));

        let condensed = condense_to_well(&network).expect("condense");
        assert!((condensed[0].1 - 1.0 / 3.0).abs() < 1.0e-12);
    }

    #[test]
    fn large_fracture_conductivity_approaches_matrix_sum() {
        let mut network = FractureNetwork::new(3);
        network.internal_links.push((0, 1, 1.0e9));
        network.internal_links.push((1, 2, 1.0e9));
        network.well_links.push((1, 1.0e9));
        network.matrix_links.push((0, 10, 0.5));
        network.matrix_links.push((2, 11, 0.25));
        network.matrix_links.push((2, 10, 0.5));

        let condensed = condense_to_well(&network).expect("condense");
        assert_eq!(condensed.iter().map(|entry| entry.0).collect::<Vec<_>>(), vec![10, 11]);
        assert!((condensed[0].1 - 1.0).abs() < 1.0e-6);
        assert!((condensed[1].1 - 0.25).abs() < 1.0e-6);
    }

    #[test]
    fn islands_without_well_access_are_ignored() {
        let mut network = FractureNetwork::new(3);
        network.well_links.push((0, 1.0));
        network.matrix_links.push((0, 1, 1.0));
        network.matrix_links.push((2, 5, 1.0));

        let condensed = condense_to_well(&network).expect("condense");
        assert_eq!(condensed.len(), 1);
        assert_eq!(condensed[0].0, 1);

        assert!(condense_to_well(&FractureNetwork::new(2)).expect("empty").is_empty());
    }
}
