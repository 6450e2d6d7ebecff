//! Genomes are the focus of evolution in NEAT.
//! They are a collection of node genes and connection genes
//! whose innovation numbers record their historical origin,
//! which is what makes genomes of independent lineages
//! comparable and recombinable.

mod activation;
mod alignment;
mod config;
mod errors;
mod genes;
mod history;
mod identity;
mod nodes;

pub use activation::{Activation, ActivationFn, ActivationRegistry, ActivationType};
pub use alignment::{align, align_with, Alignment, AlignmentObserver, AlignmentStats, LogObserver, Side};
pub use config::GeneticConfig;
pub use errors::{ActivationError, AlignmentError, GeneError, GenomeError};
pub use genes::{connection_exists, ConnectionGene, ConnectionIndex};
pub use history::{InnovationRegistry, Resolution, SharedRegistry};
pub use identity::{Identity, ProvisionalToken};
pub use nodes::{NodeGene, NodeIndex, NodeRole};

use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// The gene arena of a single genome.
///
/// Every node and connection gene of the genome is owned here;
/// connection endpoints, hidden node parents and adjacency lists
/// are indices into this arena. Genes are never removed, so
/// indices stay valid for the genome's lifetime.
///
/// Cloning a genome copies the whole arena, indices included.
/// Provisional nodes of the clone receive fresh tokens.
#[derive(PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "GenomeGenes")]
pub struct Genome {
    nodes: Vec<NodeGene>,
    connections: Vec<ConnectionGene>,
}

impl Genome {
    /// Creates an empty genome.
    pub fn new() -> Genome {
        Genome::default()
    }

    /// Adds a node gene to the genome and returns its index.
    ///
    /// # Errors
    /// Returns an error if the node is hidden and either of
    /// its parents is not part of the genome.
    pub fn add_node(&mut self, node: NodeGene) -> Result<NodeIndex, GenomeError> {
        if let Ok((source, destination)) = node.parent_pair() {
            self.check_node(source)?;
            self.check_node(destination)?;
        }
        self.nodes.push(node);
        Ok(NodeIndex(self.nodes.len() - 1))
    }

    /// Adds a connection gene to the genome, records it in
    /// the adjacency lists of both endpoints and returns its index.
    ///
    /// # Errors
    /// Returns an error if either endpoint is not part of the genome.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{ActivationType, ConnectionGene, Genome, NodeGene};
    ///
    /// let mut genome = Genome::new();
    /// let a = genome.add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0)).unwrap();
    /// let b = genome.add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0)).unwrap();
    ///
    /// let c = genome.add_connection(ConnectionGene::new(Some(0), a, b, 0.5, true)).unwrap();
    ///
    /// assert_eq!(genome.node(a).unwrap().outgoing(), &[c]);
    /// assert_eq!(genome.node(b).unwrap().incoming(), &[c]);
    /// ```
    pub fn add_connection(&mut self, connection: ConnectionGene) -> Result<ConnectionIndex, GenomeError> {
        let (source, destination) = connection.endpoints();
        let index = self.add_connection_unwired(connection)?;
        self.nodes[source.0].add_outgoing(index);
        self.nodes[destination.0].add_incoming(index);
        Ok(index)
    }

    /// Adds a connection gene to the genome without touching
    /// the adjacency lists of its endpoints.
    ///
    /// # Errors
    /// Returns an error if either endpoint is not part of the genome.
    pub fn add_connection_unwired(
        &mut self,
        connection: ConnectionGene,
    ) -> Result<ConnectionIndex, GenomeError> {
        self.check_node(connection.source())?;
        self.check_node(connection.destination())?;
        self.connections.push(connection);
        Ok(ConnectionIndex(self.connections.len() - 1))
    }

    /// Splits a connection in two, placing a new hidden node
    /// in between. The old connection is disabled; the one leading
    /// into the new node has weight 1 and the one leaving it inherits
    /// the old weight.
    ///
    /// The node and both connections are left without innovation
    /// numbers, to be resolved by an [`InnovationRegistry`].
    /// Returns `(new node, incoming connection, outgoing connection)`.
    ///
    /// # Errors
    /// Returns an error if the connection is not part of the genome.
    pub fn split_connection(
        &mut self,
        connection: ConnectionIndex,
        config: &GeneticConfig,
    ) -> Result<(NodeIndex, ConnectionIndex, ConnectionIndex), GenomeError> {
        let split = self
            .connections
            .get_mut(connection.0)
            .ok_or(GenomeError::NonexistentConnection(connection))?;
        split.set_enabled(false);
        let (source, destination) = split.endpoints();
        let weight = split.weight();

        let node = self.add_node(NodeGene::hidden(
            None,
            config.hidden_activation.into(),
            config.initial_activation,
            (source, destination),
        ))?;
        let incoming = self.add_connection(ConnectionGene::new(None, source, node, 1.0, true))?;
        let outgoing = self.add_connection(ConnectionGene::new(None, node, destination, weight, true))?;

        Ok((node, incoming, outgoing))
    }

    /// Copies a node of another genome into this one, without
    /// its connections (see [`NodeGene::shallow_copy`]).
    ///
    /// A hidden node's parents are looked up in this genome
    /// by innovation number.
    ///
    /// # Errors
    /// Returns an error if the node is not part of `donor`, or if
    /// it is hidden and its parents are provisional or absent here.
    pub fn adopt_node(&mut self, donor: &Genome, node: NodeIndex) -> Result<NodeIndex, GenomeError> {
        let original = donor.node(node).ok_or(GenomeError::NonexistentNode(node))?;
        let mut copy = original.shallow_copy();
        if let Ok((source, destination)) = original.parent_pair() {
            copy.set_parents((self.counterpart(donor, source)?, self.counterpart(donor, destination)?));
        }
        self.add_node(copy)
    }

    /// Finds the node of `self` homologous to `donor`'s node.
    fn counterpart(&self, donor: &Genome, node: NodeIndex) -> Result<NodeIndex, GenomeError> {
        let id = donor
            .node(node)
            .ok_or(GenomeError::NonexistentNode(node))?
            .innovation()
            .ok_or(GenomeError::UnresolvedParent(node))?;
        self.node_by_innovation(id).ok_or(GenomeError::MissingParent(id))
    }

    fn check_node(&self, node: NodeIndex) -> Result<(), GenomeError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(GenomeError::NonexistentNode(node))
        }
    }

    pub fn node(&self, node: NodeIndex) -> Option<&NodeGene> {
        self.nodes.get(node.0)
    }

    pub fn node_mut(&mut self, node: NodeIndex) -> Option<&mut NodeGene> {
        self.nodes.get_mut(node.0)
    }

    pub fn connection(&self, connection: ConnectionIndex) -> Option<&ConnectionGene> {
        self.connections.get(connection.0)
    }

    pub fn connection_mut(&mut self, connection: ConnectionIndex) -> Option<&mut ConnectionGene> {
        self.connections.get_mut(connection.0)
    }

    /// Returns an iterator over the genome's nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &NodeGene)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Returns an iterator over the genome's connections, in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionIndex, &ConnectionGene)> {
        self.connections
            .iter()
            .enumerate()
            .map(|(i, c)| (ConnectionIndex(i), c))
    }

    /// Returns an iterator over the connection genes alone,
    /// in the form accepted by [`align`].
    pub fn connection_genes(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns the index of the node with the given innovation number.
    pub fn node_by_innovation(&self, id: Innovation) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|n| n.innovation() == Some(id))
            .map(NodeIndex)
    }

    /// Returns the index of the connection with the given innovation number.
    pub fn connection_by_innovation(&self, id: Innovation) -> Option<ConnectionIndex> {
        self.connections
            .iter()
            .position(|c| c.innovation() == Some(id))
            .map(ConnectionIndex)
    }

    /// Resets the cached output of every node.
    pub fn reset_activations(&mut self) {
        self.nodes.iter_mut().for_each(NodeGene::reset_activation);
    }
}

/// Serialized form of a [`Genome`]. Every index held by its
/// genes is checked against the arena before conversion.
#[derive(Deserialize)]
struct GenomeGenes {
    nodes: Vec<NodeGene>,
    connections: Vec<ConnectionGene>,
}

impl TryFrom<GenomeGenes> for Genome {
    type Error = GenomeError;

    fn try_from(genes: GenomeGenes) -> Result<Genome, GenomeError> {
        let genome = Genome {
            nodes: genes.nodes,
            connections: genes.connections,
        };
        for connection in &genome.connections {
            genome.check_node(connection.source())?;
            genome.check_node(connection.destination())?;
        }
        for node in &genome.nodes {
            if let Ok((source, destination)) = node.parent_pair() {
                genome.check_node(source)?;
                genome.check_node(destination)?;
            }
            for &connection in node.incoming().iter().chain(node.outgoing()) {
                if genome.connection(connection).is_none() {
                    return Err(GenomeError::NonexistentConnection(connection));
                }
            }
        }
        Ok(genome)
    }
}

impl Clone for Genome {
    fn clone(&self) -> Genome {
        Genome {
            nodes: self.nodes.iter().map(NodeGene::replicate).collect(),
            connections: self.connections.clone(),
        }
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<&NodeGene> = self.nodes.iter().collect();
        let mut connections: Vec<&ConnectionGene> = self.connections.iter().collect();
        nodes.sort_by_key(|n| n.innovation().unwrap_or(Innovation::MAX));
        connections.sort_by_key(|c| c.innovation().unwrap_or(Innovation::MAX));
        f.debug_struct("Genome")
            .field("Nodes", &nodes.iter().map(|n| n.to_string()).collect::<Vec<_>>())
            .field(
                "Connections",
                &connections.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_genome() -> (Genome, NodeIndex, NodeIndex, ConnectionIndex) {
        let mut genome = Genome::new();
        let input = genome
            .add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0))
            .unwrap();
        let output = genome
            .add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0))
            .unwrap();
        let gene = genome
            .add_connection(ConnectionGene::new(Some(0), input, output, 2.5, true))
            .unwrap();
        (genome, input, output, gene)
    }

    #[test]
    fn add_node_checks_parents() {
        let mut genome = Genome::new();
        let hidden = NodeGene::hidden(None, ActivationType::Sigmoid.into(), 0.0, (NodeIndex(0), NodeIndex(1)));
        assert_eq!(
            genome.add_node(hidden),
            Err(GenomeError::NonexistentNode(NodeIndex(0)))
        );
        assert_eq!(genome.node_count(), 0);
    }

    #[test]
    fn add_connection_wires_both_sides() {
        let (genome, input, output, gene) = minimal_genome();
        assert_eq!(genome.node(input).unwrap().outgoing(), &[gene]);
        assert!(genome.node(input).unwrap().incoming().is_empty());
        assert_eq!(genome.node(output).unwrap().incoming(), &[gene]);
        assert_eq!(genome.connection(gene).unwrap().weight(), 2.5);
    }

    #[test]
    fn add_connection_invalid_endpoints() {
        let (mut genome, input, _, _) = minimal_genome();
        let result = genome.add_connection(ConnectionGene::new(None, input, NodeIndex(7), 1.0, true));
        assert_eq!(result, Err(GenomeError::NonexistentNode(NodeIndex(7))));
        assert_eq!(genome.connection_count(), 1);
    }

    #[test]
    fn add_connection_unwired() {
        let (mut genome, input, output, _) = minimal_genome();
        let c = genome
            .add_connection_unwired(ConnectionGene::new(None, output, input, 1.0, true))
            .unwrap();
        assert!(!genome.node(output).unwrap().outgoing().contains(&c));
        assert!(!genome.node(input).unwrap().incoming().contains(&c));
    }

    #[test]
    fn split_connection() {
        let (mut genome, input, output, gene) = minimal_genome();
        let config = GeneticConfig {
            initial_activation: 0.5,
            hidden_activation: ActivationType::ReLU,
            ..GeneticConfig::zero()
        };
        let (node, into, out_of) = genome.split_connection(gene, &config).unwrap();

        assert!(!genome.connection(gene).unwrap().enabled());

        let hidden = genome.node(node).unwrap();
        assert!(hidden.is_provisional());
        assert_eq!(hidden.role(), NodeRole::Hidden);
        assert_eq!(hidden.parent_pair(), Ok((input, output)));
        assert_eq!(hidden.activation().name(), "relu");
        assert_eq!(hidden.activation_value(), 0.5);

        let into = genome.connection(into).unwrap();
        assert_eq!(into.endpoints(), (input, node));
        assert_eq!(into.weight(), 1.0);
        assert_eq!(into.innovation(), None);

        let out_of = genome.connection(out_of).unwrap();
        assert_eq!(out_of.endpoints(), (node, output));
        assert_eq!(out_of.weight(), 2.5);

        assert!(connection_exists(&genome, input, node));
        assert!(connection_exists(&genome, node, output));
    }

    #[test]
    fn split_nonexistent_connection() {
        let (mut genome, _, _, _) = minimal_genome();
        assert_eq!(
            genome.split_connection(ConnectionIndex(3), &GeneticConfig::zero()),
            Err(GenomeError::NonexistentConnection(ConnectionIndex(3)))
        );
    }

    #[test]
    fn adopt_node_remaps_parents() {
        let (mut donor, _, _, gene) = minimal_genome();
        let (hidden, _, _) = donor.split_connection(gene, &GeneticConfig::zero()).unwrap();
        donor.node_mut(hidden).unwrap().resolve_id(2).unwrap();

        // Same nodes, inserted in the opposite order.
        let mut genome = Genome::new();
        let output = genome
            .add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0))
            .unwrap();
        let input = genome
            .add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0))
            .unwrap();

        let adopted = genome.adopt_node(&donor, hidden).unwrap();
        let node = genome.node(adopted).unwrap();
        assert_eq!(node.innovation(), Some(2));
        assert_eq!(node.parent_pair(), Ok((input, output)));
        assert!(node.incoming().is_empty() && node.outgoing().is_empty());
    }

    #[test]
    fn adopt_node_requires_resolved_parents() {
        let (mut donor, _, _, gene) = minimal_genome();
        let (first, _, out_of) = donor.split_connection(gene, &GeneticConfig::zero()).unwrap();
        let (second, _, _) = donor.split_connection(out_of, &GeneticConfig::zero()).unwrap();

        let (mut genome, _, _, _) = minimal_genome();
        assert_eq!(
            genome.adopt_node(&donor, second),
            Err(GenomeError::UnresolvedParent(first))
        );

        let mut empty = Genome::new();
        assert_eq!(
            empty.adopt_node(&donor, first),
            Err(GenomeError::MissingParent(0))
        );
    }

    #[test]
    fn lookups_by_innovation() {
        let (genome, _, output, gene) = minimal_genome();
        assert_eq!(genome.node_by_innovation(1), Some(output));
        assert_eq!(genome.node_by_innovation(9), None);
        assert_eq!(genome.connection_by_innovation(0), Some(gene));
    }

    #[test]
    fn reset_activations() {
        let (mut genome, input, output, _) = minimal_genome();
        genome.node_mut(input).unwrap().activate(3.0);
        genome.node_mut(output).unwrap().activate(3.0);
        genome.reset_activations();
        assert!(genome.nodes().all(|(_, n)| n.activation_value() == 0.0));
    }

    #[test]
    fn clone_renews_provisional_tokens() {
        let (mut genome, _, _, gene) = minimal_genome();
        let (hidden, _, _) = genome.split_connection(gene, &GeneticConfig::zero()).unwrap();
        let copy = genome.clone();

        assert_eq!(copy.node_count(), genome.node_count());
        assert_eq!(copy.connection_count(), genome.connection_count());
        assert_ne!(copy.node(hidden).unwrap().id(), genome.node(hidden).unwrap().id());
        assert_eq!(
            copy.node(hidden).unwrap().incoming(),
            genome.node(hidden).unwrap().incoming()
        );
    }

    #[test]
    fn deserialize_checks_indices() {
        let (mut genome, _, _, gene) = minimal_genome();
        genome.split_connection(gene, &GeneticConfig::zero()).unwrap();
        let json = serde_json::to_value(&genome).unwrap();

        let mut dangling_endpoint = json.clone();
        dangling_endpoint["connections"][0]["destination"] = serde_json::json!(9);
        assert!(serde_json::from_value::<Genome>(dangling_endpoint).is_err());

        let mut dangling_parent = json.clone();
        dangling_parent["nodes"][2]["parents"][1] = serde_json::json!(5);
        assert!(serde_json::from_value::<Genome>(dangling_parent).is_err());

        let mut dangling_adjacency = json.clone();
        dangling_adjacency["nodes"][0]["outgoing"][0] = serde_json::json!(8);
        assert!(serde_json::from_value::<Genome>(dangling_adjacency).is_err());

        let back: Genome = serde_json::from_value(json).unwrap();
        assert_eq!(back.node_count(), genome.node_count());
        assert_eq!(back.connection_count(), genome.connection_count());
    }

    #[test]
    fn serde_round_trip() {
        let (genome, _, _, _) = minimal_genome();
        let json = serde_json::to_string(&genome).unwrap();
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, genome);
    }
}
