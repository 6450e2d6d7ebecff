use super::identity::resolve_once;
use super::{GeneError, Genome, NodeIndex};
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Position of a connection gene in its genome's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionIndex(pub(crate) usize);

impl ConnectionIndex {
    /// Returns the raw arena position.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ConnectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Connection genes are created between two nodes,
/// and become weighted edges in the genome's phenotype.
///
/// A connection may be created without an innovation number,
/// so that many connections can be built before a single
/// numbering pass assigns equal numbers to homologous
/// connections of sibling genomes.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    id: Option<Innovation>,
    source: NodeIndex,
    destination: NodeIndex,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new connection gene with the specified parameters.
    pub fn new(
        id: Option<Innovation>,
        source: NodeIndex,
        destination: NodeIndex,
        weight: f32,
        enabled: bool,
    ) -> ConnectionGene {
        ConnectionGene {
            id,
            source,
            destination,
            weight,
            enabled,
        }
    }

    /// Returns the connection's innovation number, if assigned.
    pub fn innovation(&self) -> Option<Innovation> {
        self.id
    }

    /// Assigns the connection's innovation number.
    ///
    /// # Errors
    /// Returns an error if the connection already has an
    /// innovation number, which is left untouched.
    pub fn resolve_id(&mut self, id: Innovation) -> Result<(), GeneError> {
        resolve_once(&mut self.id, id)
    }

    pub fn source(&self) -> NodeIndex {
        self.source
    }

    pub fn destination(&self) -> NodeIndex {
        self.destination
    }

    /// Returns the connection's source and destination nodes.
    pub fn endpoints(&self) -> (NodeIndex, NodeIndex) {
        (self.source, self.destination)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Returns whether the connection takes part
    /// in network evaluation.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.map_or_else(|| "?".to_owned(), |id| id.to_string());
        write!(
            f,
            "{}{}[{}->{}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            id,
            self.source,
            self.destination,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

/// Checks whether the connection `source -> destination`
/// exists in `genome`.
///
/// The connection exists if `destination`'s incoming connections
/// or `source`'s outgoing connections hold an edge with these
/// endpoints. Each list is scanned on its own, since a genome
/// under construction may have wired only one side.
///
/// # Examples
/// ```
/// use neat_genes::genomics::{connection_exists, ActivationType, ConnectionGene, Genome, NodeGene};
///
/// let mut genome = Genome::new();
/// let a = genome.add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0)).unwrap();
/// let b = genome.add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0)).unwrap();
///
/// assert!(!connection_exists(&genome, a, b));
///
/// genome.add_connection(ConnectionGene::new(None, a, b, 1.0, true)).unwrap();
///
/// assert!(connection_exists(&genome, a, b));
/// assert!(!connection_exists(&genome, b, a));
/// ```
pub fn connection_exists(genome: &Genome, source: NodeIndex, destination: NodeIndex) -> bool {
    let incoming = genome.node(destination).map_or(&[][..], |n| n.incoming());
    let outgoing = genome.node(source).map_or(&[][..], |n| n.outgoing());
    incoming.iter().chain(outgoing).any(|&c| {
        genome
            .connection(c)
            .map_or(false, |gene| gene.endpoints() == (source, destination))
    })
}
