use super::{Activation, ConnectionIndex, GeneError, Identity};
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Position of a node gene in its genome's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Returns the raw arena position.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A NodeRole indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Input nodes.
    Input,
    /// Constant-output nodes.
    Bias,
    /// Nodes created by splitting a connection.
    Hidden,
    /// Output nodes.
    Output,
}

/// Node genes are the structural elements of genomes
/// between which connection genes are created.
///
/// A node's identity starts either as a permanent innovation
/// number or as a provisional token, and can be made permanent
/// exactly once. Hidden nodes remember the two nodes of the
/// connection they were split from, so that independently
/// evolved genomes splitting the same connection can later
/// be given the same innovation number.
///
/// `NodeGene` is deliberately not `Clone`: copying a node
/// into another genome goes through [`shallow_copy`], which
/// leaves the topology behind.
///
/// [`shallow_copy`]: NodeGene::shallow_copy
#[derive(PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "NodeGeneFields")]
pub struct NodeGene {
    identity: Identity,
    role: NodeRole,
    activation: Activation,
    initial_activation: f32,
    value: f32,
    parents: Option<(NodeIndex, NodeIndex)>,
    incoming: Vec<ConnectionIndex>,
    outgoing: Vec<ConnectionIndex>,
}

impl NodeGene {
    /// Creates a node gene with the given role.
    ///
    /// If `id` is `None`, the node receives a provisional identity.
    ///
    /// # Errors
    /// Hidden nodes require a parent pair and all other roles
    /// forbid one; any other combination is an error.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{ActivationType, NodeGene, NodeRole};
    ///
    /// let node = NodeGene::new(Some(5), NodeRole::Output, ActivationType::Sigmoid.into(), 0.0, None).unwrap();
    /// assert_eq!(node.innovation(), Some(5));
    ///
    /// assert!(NodeGene::new(None, NodeRole::Hidden, ActivationType::Sigmoid.into(), 0.0, None).is_err());
    /// ```
    pub fn new(
        id: Option<Innovation>,
        role: NodeRole,
        activation: Activation,
        initial_activation: f32,
        parents: Option<(NodeIndex, NodeIndex)>,
    ) -> Result<NodeGene, GeneError> {
        check_parentage(role, parents)?;
        Ok(Self::new_unchecked(
            Identity::from_innovation(id),
            role,
            activation,
            initial_activation,
            parents,
        ))
    }

    /// Creates an input node.
    pub fn input(id: Option<Innovation>, activation: Activation, initial_activation: f32) -> NodeGene {
        Self::new_unchecked(Identity::from_innovation(id), NodeRole::Input, activation, initial_activation, None)
    }

    /// Creates a bias node.
    pub fn bias(id: Option<Innovation>, activation: Activation, initial_activation: f32) -> NodeGene {
        Self::new_unchecked(Identity::from_innovation(id), NodeRole::Bias, activation, initial_activation, None)
    }

    /// Creates an output node.
    pub fn output(id: Option<Innovation>, activation: Activation, initial_activation: f32) -> NodeGene {
        Self::new_unchecked(Identity::from_innovation(id), NodeRole::Output, activation, initial_activation, None)
    }

    /// Creates a hidden node split from the connection
    /// `parents.0 -> parents.1`.
    pub fn hidden(
        id: Option<Innovation>,
        activation: Activation,
        initial_activation: f32,
        parents: (NodeIndex, NodeIndex),
    ) -> NodeGene {
        Self::new_unchecked(
            Identity::from_innovation(id),
            NodeRole::Hidden,
            activation,
            initial_activation,
            Some(parents),
        )
    }

    fn new_unchecked(
        identity: Identity,
        role: NodeRole,
        activation: Activation,
        initial_activation: f32,
        parents: Option<(NodeIndex, NodeIndex)>,
    ) -> NodeGene {
        NodeGene {
            identity,
            role,
            activation,
            initial_activation,
            value: initial_activation,
            parents,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Returns the node's identity: the innovation number
    /// if assigned, the provisional token otherwise.
    pub fn id(&self) -> Identity {
        self.identity
    }

    /// Returns the node's innovation number, if assigned.
    pub fn innovation(&self) -> Option<Innovation> {
        self.identity.permanent()
    }

    /// Assigns the node's innovation number.
    ///
    /// # Errors
    /// Returns an error if the node already has an
    /// innovation number, which is left untouched.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{ActivationType, NodeGene};
    ///
    /// let mut node = NodeGene::output(None, ActivationType::Sigmoid.into(), 0.0);
    /// assert!(node.is_provisional());
    ///
    /// node.resolve_id(4).unwrap();
    /// assert!(!node.is_provisional());
    ///
    /// assert!(node.resolve_id(9).is_err());
    /// assert_eq!(node.innovation(), Some(4));
    /// ```
    pub fn resolve_id(&mut self, id: Innovation) -> Result<(), GeneError> {
        self.identity.resolve(id)
    }

    pub fn is_provisional(&self) -> bool {
        self.identity.is_provisional()
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn initial_activation(&self) -> f32 {
        self.initial_activation
    }

    /// Returns the node's cached output.
    pub fn activation_value(&self) -> f32 {
        self.value
    }

    /// Returns the `(source, destination)` nodes of the
    /// connection this node was split from.
    ///
    /// # Errors
    /// Returns [`GeneError::InvalidRole`] if the node is not hidden.
    pub fn parent_pair(&self) -> Result<(NodeIndex, NodeIndex), GeneError> {
        match (self.role, self.parents) {
            (NodeRole::Hidden, Some(parents)) => Ok(parents),
            (role, _) => Err(GeneError::InvalidRole(role)),
        }
    }

    /// Applies the activation function to `input`
    /// and caches the result.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{ActivationType, NodeGene};
    ///
    /// let mut node = NodeGene::output(Some(0), ActivationType::ReLU.into(), 0.25);
    ///
    /// node.activate(-3.0);
    /// assert_eq!(node.activation_value(), 0.0);
    /// node.activate(2.0);
    /// assert_eq!(node.activation_value(), 2.0);
    ///
    /// node.reset_activation();
    /// assert_eq!(node.activation_value(), 0.25);
    /// ```
    pub fn activate(&mut self, input: f32) {
        self.value = self.activation.apply(input);
    }

    /// Restores the cached output to its initial value.
    pub fn reset_activation(&mut self) {
        self.value = self.initial_activation;
    }

    /// Returns a copy of the node without its connections.
    ///
    /// The copy keeps the role, activation function, initial
    /// activation and parent pair. A permanent innovation number
    /// is kept as well; a provisional node gets a fresh token.
    pub fn shallow_copy(&self) -> NodeGene {
        let identity = match self.identity {
            Identity::Permanent(id) => Identity::Permanent(id),
            Identity::Provisional(_) => Identity::provisional(),
        };
        Self::new_unchecked(
            identity,
            self.role,
            self.activation.clone(),
            self.initial_activation,
            self.parents,
        )
    }

    /// Returns a full copy of the node, topology and cached output
    /// included. Provisional nodes get a fresh token.
    pub(super) fn replicate(&self) -> NodeGene {
        NodeGene {
            value: self.value,
            incoming: self.incoming.clone(),
            outgoing: self.outgoing.clone(),
            ..self.shallow_copy()
        }
    }

    pub(super) fn set_parents(&mut self, parents: (NodeIndex, NodeIndex)) {
        self.parents = Some(parents);
    }

    /// Returns the connections ending at this node.
    pub fn incoming(&self) -> &[ConnectionIndex] {
        &self.incoming
    }

    /// Returns the connections leaving this node.
    pub fn outgoing(&self) -> &[ConnectionIndex] {
        &self.outgoing
    }

    /// Records a connection ending at this node.
    pub fn add_incoming(&mut self, connection: ConnectionIndex) {
        self.incoming.push(connection);
    }

    /// Records a connection leaving this node.
    pub fn add_outgoing(&mut self, connection: ConnectionIndex) {
        self.outgoing.push(connection);
    }
}

fn check_parentage(role: NodeRole, parents: Option<(NodeIndex, NodeIndex)>) -> Result<(), GeneError> {
    match (role, parents) {
        (NodeRole::Hidden, None) => Err(GeneError::MissingParents),
        (NodeRole::Hidden, Some(_)) | (_, None) => Ok(()),
        (role, Some(_)) => Err(GeneError::UnexpectedParents(role)),
    }
}

/// Serialized form of a [`NodeGene`], checked
/// like [`NodeGene::new`] before conversion.
#[derive(Deserialize)]
struct NodeGeneFields {
    identity: Identity,
    role: NodeRole,
    activation: Activation,
    initial_activation: f32,
    value: f32,
    parents: Option<(NodeIndex, NodeIndex)>,
    incoming: Vec<ConnectionIndex>,
    outgoing: Vec<ConnectionIndex>,
}

impl TryFrom<NodeGeneFields> for NodeGene {
    type Error = GeneError;

    fn try_from(fields: NodeGeneFields) -> Result<NodeGene, GeneError> {
        check_parentage(fields.role, fields.parents)?;
        Ok(NodeGene {
            identity: fields.identity,
            role: fields.role,
            activation: fields.activation,
            initial_activation: fields.initial_activation,
            value: fields.value,
            parents: fields.parents,
            incoming: fields.incoming,
            outgoing: fields.outgoing,
        })
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:?}, {}, IN: {:?}, OUT: {:?}]",
            self.identity, self.role, self.activation, self.incoming, self.outgoing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ActivationType;

    fn sigmoid() -> Activation {
        ActivationType::Sigmoid.into()
    }

    #[test]
    fn new_checks_parentage() {
        let parents = (NodeIndex(0), NodeIndex(1));
        for role in [NodeRole::Input, NodeRole::Bias, NodeRole::Output] {
            assert!(NodeGene::new(None, role, sigmoid(), 0.0, None).is_ok());
            assert_eq!(
                NodeGene::new(None, role, sigmoid(), 0.0, Some(parents)),
                Err(GeneError::UnexpectedParents(role))
            );
        }
        assert_eq!(
            NodeGene::new(None, NodeRole::Hidden, sigmoid(), 0.0, None),
            Err(GeneError::MissingParents)
        );
        assert!(NodeGene::new(None, NodeRole::Hidden, sigmoid(), 0.0, Some(parents)).is_ok());
    }

    #[test]
    fn provisional_id() {
        let node = NodeGene::input(None, sigmoid(), 0.0);
        assert!(node.is_provisional());
        assert!(matches!(node.id(), Identity::Provisional(_)));
        assert_eq!(node.innovation(), None);

        let node = NodeGene::input(Some(2), sigmoid(), 0.0);
        assert!(!node.is_provisional());
        assert_eq!(node.id(), Identity::Permanent(2));
    }

    #[test]
    fn resolve_id_twice() {
        let mut node = NodeGene::hidden(None, sigmoid(), 0.0, (NodeIndex(0), NodeIndex(1)));
        node.resolve_id(10).unwrap();
        assert_eq!(
            node.resolve_id(11),
            Err(GeneError::IdentityAlreadySet {
                current: 10,
                attempted: 11
            })
        );
        assert_eq!(node.id(), Identity::Permanent(10));

        let mut node = NodeGene::bias(Some(3), sigmoid(), 1.0);
        assert!(node.resolve_id(3).is_err());
        assert_eq!(node.innovation(), Some(3));
    }

    #[test]
    fn parent_pair() {
        let parents = (NodeIndex(4), NodeIndex(2));
        let hidden = NodeGene::hidden(None, sigmoid(), 0.0, parents);
        assert_eq!(hidden.parent_pair(), Ok(parents));

        assert_eq!(
            NodeGene::input(None, sigmoid(), 0.0).parent_pair(),
            Err(GeneError::InvalidRole(NodeRole::Input))
        );
        assert_eq!(
            NodeGene::bias(None, sigmoid(), 0.0).parent_pair(),
            Err(GeneError::InvalidRole(NodeRole::Bias))
        );
        assert_eq!(
            NodeGene::output(None, sigmoid(), 0.0).parent_pair(),
            Err(GeneError::InvalidRole(NodeRole::Output))
        );
    }

    #[test]
    fn reset_after_many_activations() {
        let mut node = NodeGene::output(Some(0), ActivationType::Identity.into(), -0.5);
        for i in 0..50 {
            node.activate(i as f32);
            assert_eq!(node.activation_value(), i as f32);
        }
        node.reset_activation();
        assert_eq!(node.activation_value(), -0.5);
    }

    #[test]
    fn shallow_copy() {
        let parents = (NodeIndex(0), NodeIndex(3));
        let mut node = NodeGene::hidden(Some(8), sigmoid(), 0.1, parents);
        node.add_incoming(ConnectionIndex(0));
        node.add_outgoing(ConnectionIndex(1));
        node.add_outgoing(ConnectionIndex(2));
        node.activate(1.0);

        let copy = node.shallow_copy();
        assert!(copy.incoming().is_empty());
        assert!(copy.outgoing().is_empty());
        assert_eq!(copy.id(), Identity::Permanent(8));
        assert_eq!(copy.role(), NodeRole::Hidden);
        assert_eq!(copy.initial_activation(), 0.1);
        assert_eq!(copy.activation_value(), 0.1);
        assert_eq!(copy.parent_pair(), Ok(parents));
        assert!(copy.activation().shares_transform(node.activation()));
    }

    #[test]
    fn shallow_copy_of_provisional_gets_new_token() {
        let node = NodeGene::output(None, sigmoid(), 0.0);
        let copy = node.shallow_copy();
        assert!(copy.is_provisional());
        assert_ne!(copy.id(), node.id());
    }

    #[test]
    fn replicate_keeps_topology() {
        let mut node = NodeGene::output(Some(1), sigmoid(), 0.0);
        node.add_incoming(ConnectionIndex(7));
        let copy = node.replicate();
        assert_eq!(copy.incoming(), &[ConnectionIndex(7)]);
        assert_eq!(copy, node);
    }

    #[test]
    fn deserialize_checks_parentage() {
        let hidden = NodeGene::hidden(Some(4), sigmoid(), 0.0, (NodeIndex(0), NodeIndex(1)));
        let json = serde_json::to_value(&hidden).unwrap();
        let back: NodeGene = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, hidden);

        let mut orphan = json.clone();
        orphan["parents"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<NodeGene>(orphan).is_err());

        let mut adopted_output = json;
        adopted_output["role"] = serde_json::json!("Output");
        assert!(serde_json::from_value::<NodeGene>(adopted_output).is_err());
    }
}
