use crate::genomics::{ConnectionIndex, NodeIndex, NodeRole, Side};
use crate::Innovation;

use thiserror::Error;

/// An error type indicating the misuse
/// of a single node or connection gene.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneError {
    /// The gene already carries a permanent identity.
    #[error("attempted to assign id {attempted} to a gene that already has id {current}")]
    IdentityAlreadySet {
        current: Innovation,
        attempted: Innovation,
    },
    /// Parentage was requested from a node that is not hidden.
    #[error("attempted to get the parents of a non-hidden {0:?} node")]
    InvalidRole(NodeRole),
    /// A parent pair was supplied for a node that is not hidden.
    #[error("parent pair supplied for a non-hidden {0:?} node")]
    UnexpectedParents(NodeRole),
    /// A hidden node was created without a parent pair.
    #[error("hidden node created without a parent pair")]
    MissingParents,
}

/// An error type indicating the collections
/// handed to the alignment are not alignable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    /// A connection had no innovation number.
    #[error("connection at position {position} of the {side} collection has no innovation number")]
    UnresolvedIdentity { side: Side, position: usize },
    /// Two connections in the same collection share an innovation number.
    #[error("duplicate innovation number {id} in the {side} collection")]
    DuplicateIdentity { side: Side, id: Innovation },
}

/// An error type indicating an invalid operation
/// on a genome's gene arena.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomeError {
    /// The node index does not belong to the genome.
    #[error("nonexistant node {0}")]
    NonexistentNode(NodeIndex),
    /// The connection index does not belong to the genome.
    #[error("nonexistant connection {0}")]
    NonexistentConnection(ConnectionIndex),
    /// A parent of an adopted node has no permanent identity yet.
    #[error("parent node {0} of adopted node has no innovation number")]
    UnresolvedParent(NodeIndex),
    /// No node with the parent's innovation number exists in the adopting genome.
    #[error("adopting genome has no parent node with id {0}")]
    MissingParent(Innovation),
    /// A connection endpoint has no innovation number.
    #[error("endpoint node {0} of connection has no innovation number")]
    UnresolvedEndpoint(NodeIndex),
    /// Some provisional nodes could not be assigned an innovation number.
    #[error("{0} provisional node(s) could not be resolved")]
    UnresolvableNodes(usize),
    #[error(transparent)]
    Gene(#[from] GeneError),
}

/// An error type indicating a failed
/// activation function lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("unknown activation function {0:?}")]
    UnknownActivation(String),
}
