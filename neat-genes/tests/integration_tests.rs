//! Integration tests for neat-genes.

use neat_genes::genomics::{
    align, connection_exists, ActivationType, ConnectionGene, GeneError, GeneticConfig, Genome,
    InnovationRegistry, NodeGene, NodeIndex, NodeRole,
};

fn base_genome() -> (Genome, Vec<NodeIndex>) {
    let mut genome = Genome::new();
    let nodes = vec![
        genome
            .add_node(NodeGene::bias(Some(0), ActivationType::Identity.into(), 1.0))
            .unwrap(),
        genome
            .add_node(NodeGene::input(Some(1), ActivationType::Identity.into(), 0.0))
            .unwrap(),
        genome
            .add_node(NodeGene::output(Some(2), ActivationType::Sigmoid.into(), 0.0))
            .unwrap(),
    ];
    genome
        .add_connection(ConnectionGene::new(Some(0), nodes[0], nodes[2], 0.5, true))
        .unwrap();
    genome
        .add_connection(ConnectionGene::new(Some(1), nodes[1], nodes[2], -1.0, true))
        .unwrap();
    (genome, nodes)
}

fn connections(ids: &[usize], source: NodeIndex, destination: NodeIndex) -> Vec<ConnectionGene> {
    ids.iter()
        .map(|&id| ConnectionGene::new(Some(id), source, destination, id as f32, true))
        .collect()
}

#[test]
fn test_identity_resolves_once() {
    let (mut genome, nodes) = base_genome();
    let (hidden, into, _) = genome
        .split_connection(genome.connection_by_innovation(1).unwrap(), &GeneticConfig::zero())
        .unwrap();

    let node = genome.node_mut(hidden).unwrap();
    node.resolve_id(7).unwrap();
    assert_eq!(
        node.resolve_id(8),
        Err(GeneError::IdentityAlreadySet {
            current: 7,
            attempted: 8
        })
    );
    assert_eq!(node.innovation(), Some(7));

    let connection = genome.connection_mut(into).unwrap();
    connection.resolve_id(4).unwrap();
    assert!(connection.resolve_id(4).is_err());
    assert_eq!(connection.innovation(), Some(4));

    let input = genome.node_mut(nodes[1]).unwrap();
    assert!(input.resolve_id(1).is_err());
}

#[test]
fn test_parent_pair_by_role() {
    let (mut genome, nodes) = base_genome();
    for &node in &nodes {
        let node = genome.node(node).unwrap();
        assert_eq!(node.parent_pair(), Err(GeneError::InvalidRole(node.role())));
    }

    let hidden = genome
        .add_node(NodeGene::hidden(
            None,
            ActivationType::Tanh.into(),
            0.0,
            (nodes[1], nodes[2]),
        ))
        .unwrap();
    let hidden = genome.node(hidden).unwrap();
    assert_eq!(hidden.role(), NodeRole::Hidden);
    assert_eq!(hidden.parent_pair(), Ok((nodes[1], nodes[2])));
}

#[test]
fn test_alignment_covers_every_innovation() {
    let (_, nodes) = base_genome();
    let first = connections(&[0, 2, 3, 7, 8], nodes[0], nodes[2]);
    let second = connections(&[1, 2, 4, 7, 9, 10], nodes[0], nodes[2]);

    let alignment = align(&first, &second).unwrap();
    assert_eq!(alignment.len(), 9);
    assert_eq!(alignment.first().len(), alignment.second().len());
    assert!(alignment.positions().all(|(_, a, b)| a.is_some() || b.is_some()));
    for (id, a, b) in alignment.positions() {
        for gene in a.into_iter().chain(b) {
            assert_eq!(gene.innovation(), Some(id));
        }
    }
}

#[test]
fn test_alignment_is_symmetric() {
    let (_, nodes) = base_genome();
    let first = connections(&[5, 1, 3], nodes[0], nodes[2]);
    let second = connections(&[2, 3, 6, 4], nodes[0], nodes[2]);

    let forward = align(&first, &second).unwrap();
    let backward = align(&second, &first).unwrap();
    assert_eq!(backward, forward.swapped());
    assert_eq!(backward.first(), forward.second());
}

#[test]
fn test_alignment_pattern() {
    let (_, nodes) = base_genome();
    let a = connections(&[1, 3, 5], nodes[0], nodes[2]);
    let b = connections(&[2, 3, 4], nodes[0], nodes[2]);

    let alignment = align(&a, &b).unwrap();
    let pattern: Vec<_> = alignment
        .positions()
        .map(|(_, a, b)| (a.is_some(), b.is_some()))
        .collect();
    assert_eq!(alignment.innovations(), &[1, 2, 3, 4, 5]);
    assert_eq!(
        pattern,
        vec![(true, false), (false, true), (true, true), (false, true), (true, false)]
    );
}

#[test]
fn test_connection_exists_one_side_wired() {
    let mut genome = Genome::new();
    let a = genome
        .add_node(NodeGene::input(None, ActivationType::Identity.into(), 0.0))
        .unwrap();
    let b = genome
        .add_node(NodeGene::output(None, ActivationType::Sigmoid.into(), 0.0))
        .unwrap();
    assert!(!connection_exists(&genome, a, b));

    let c = genome
        .add_connection_unwired(ConnectionGene::new(None, a, b, 1.0, true))
        .unwrap();
    genome.node_mut(b).unwrap().add_incoming(c);
    assert!(connection_exists(&genome, a, b));
    assert!(genome.node(a).unwrap().outgoing().is_empty());
}

#[test]
fn test_shallow_copy_drops_topology() {
    let (mut genome, nodes) = base_genome();
    let (hidden, _, _) = genome
        .split_connection(genome.connection_by_innovation(0).unwrap(), &GeneticConfig::default())
        .unwrap();
    let original = genome.node(hidden).unwrap();
    assert!(!original.incoming().is_empty() && !original.outgoing().is_empty());

    let copy = original.shallow_copy();
    assert!(copy.incoming().is_empty());
    assert!(copy.outgoing().is_empty());
    assert_eq!(copy.role(), original.role());
    assert_eq!(copy.activation(), original.activation());
    assert!(copy.activation().shares_transform(original.activation()));
    assert_eq!(copy.initial_activation(), original.initial_activation());
    assert_eq!(copy.parent_pair(), Ok((nodes[0], nodes[2])));
    assert!(copy.is_provisional());
    assert_ne!(copy.id(), original.id());
}

#[test]
fn test_reset_activation_after_many_activations() {
    let mut node = NodeGene::output(Some(3), ActivationType::Identity.into(), 0.25);
    for i in 0..10 {
        node.activate(i as f32);
    }
    assert_eq!(node.activation_value(), 9.0);
    node.reset_activation();
    assert_eq!(node.activation_value(), 0.25);
}

#[test]
fn test_independent_lineages_stay_comparable() {
    let config = GeneticConfig::default();
    let mut registry = InnovationRegistry::new();
    let (mut first, _) = base_genome();
    let (mut second, _) = base_genome();
    let shared = first.connection_by_innovation(1).unwrap();

    first.split_connection(shared, &config).unwrap();
    registry.resolve(&mut first).unwrap();
    // An unrelated mutation of `second` is numbered first.
    second
        .split_connection(second.connection_by_innovation(0).unwrap(), &config)
        .unwrap();
    registry.resolve(&mut second).unwrap();
    second.split_connection(shared, &config).unwrap();
    registry.resolve(&mut second).unwrap();

    let alignment = align(first.connection_genes(), second.connection_genes()).unwrap();
    let stats = alignment.stats();
    assert_eq!(stats.matching, 4);
    assert_eq!(stats.excess_second, 2);
    assert_eq!(stats.disjoint(), 0);

    // Every hidden node of `first` has a homologous node in `second`.
    for (_, node) in first.nodes() {
        let id = node.innovation().unwrap();
        assert!(second.node_by_innovation(id).is_some());
    }
}
