use super::{Genome, GenomeError, NodeIndex, NodeRole};
use crate::Innovation;

use ahash::RandomState;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An `InnovationRegistry` issues permanent innovation numbers
/// and keeps track of structural innovations, in order to make
/// sure identical mutations in different genomes are assigned
/// the same innovation numbers.
///
/// Hidden nodes are identified by the innovation numbers of the
/// two nodes of the connection they were split from. Connections
/// are identified by the innovation numbers of their endpoints.
///
/// Node and connection innovation numbers are counted separately,
/// and both counters only ever increase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationRegistry {
    next_node_innovation: Innovation,
    next_connection_innovation: Innovation,
    node_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    connection_innovations: HashMap<(Innovation, Innovation), Innovation, RandomState>,
}

/// Counts of the innovation numbers assigned by one
/// [`InnovationRegistry::resolve`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub nodes: usize,
    pub connections: usize,
}

impl InnovationRegistry {
    /// Creates a registry whose counters both start at 0.
    pub fn new() -> InnovationRegistry {
        InnovationRegistry::default()
    }

    /// Creates a registry whose counters start at the given values,
    /// leaving lower numbers free for genes created with a fixed
    /// innovation number (such as input and output nodes).
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::starting_at(3, 2);
    ///
    /// assert_eq!(registry.next_node_innovation(), 3);
    /// assert_eq!(registry.next_connection_innovation(), 2);
    /// assert_eq!(registry.next_node_innovation(), 4);
    /// ```
    pub fn starting_at(node: Innovation, connection: Innovation) -> InnovationRegistry {
        InnovationRegistry {
            next_node_innovation: node,
            next_connection_innovation: connection,
            ..InnovationRegistry::default()
        }
    }

    /// Issues a new node innovation number.
    pub fn next_node_innovation(&mut self) -> Innovation {
        let id = self.next_node_innovation;
        self.next_node_innovation += 1;
        id
    }

    /// Issues a new connection innovation number.
    pub fn next_connection_innovation(&mut self) -> Innovation {
        let id = self.next_connection_innovation;
        self.next_connection_innovation += 1;
        id
    }

    /// Returns the innovation number of the hidden node split from
    /// the connection between the `parents` innovation numbers,
    /// issuing a new one if no such split was recorded before.
    pub fn node_innovation(&mut self, parents: (Innovation, Innovation)) -> Innovation {
        if let Some(&id) = self.node_innovations.get(&parents) {
            return id;
        }
        let id = self.next_node_innovation();
        self.node_innovations.insert(parents, id);
        id
    }

    /// Returns the innovation number of the connection between the
    /// `endpoints` innovation numbers, issuing a new one if no such
    /// connection was recorded before.
    pub fn connection_innovation(&mut self, endpoints: (Innovation, Innovation)) -> Innovation {
        match self.connection_innovations.entry(endpoints) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = self.next_connection_innovation;
                self.next_connection_innovation += 1;
                *entry.insert(id)
            }
        }
    }

    /// Assigns innovation numbers to every provisional node and
    /// every unnumbered connection of `genome`.
    ///
    /// Hidden nodes are resolved once both their parents are
    /// permanent, so chains of splits resolve parents first. Other
    /// provisional nodes carry no structural record and always receive
    /// a new number. Connections are resolved after all nodes.
    ///
    /// If the recorded number for a split or a connection is already
    /// used within `genome` (the genome repeated a mutation it had
    /// already undergone), a new number is issued instead.
    ///
    /// Before issuing anything, the counters are moved past every
    /// innovation number already present in `genome`, and the structure
    /// of its numbered genes is recorded, so that genes numbered at
    /// construction are shared with genomes that gain them later.
    ///
    /// # Errors
    /// Returns an error if some provisional node can never be resolved.
    /// Neither the genome nor the registry is modified in that case.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{ActivationType, ConnectionGene, GeneticConfig, Genome, InnovationRegistry, NodeGene};
    ///
    /// let mut genome = Genome::new();
    /// let a = genome.add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0)).unwrap();
    /// let b = genome.add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0)).unwrap();
    /// let c = genome.add_connection(ConnectionGene::new(Some(0), a, b, 1.0, true)).unwrap();
    /// let (node, _, _) = genome.split_connection(c, &GeneticConfig::zero()).unwrap();
    ///
    /// let mut registry = InnovationRegistry::new();
    /// let resolution = registry.resolve(&mut genome).unwrap();
    ///
    /// assert_eq!(resolution.nodes, 1);
    /// assert_eq!(resolution.connections, 2);
    /// assert_eq!(genome.node(node).unwrap().innovation(), Some(2));
    /// ```
    pub fn resolve(&mut self, genome: &mut Genome) -> Result<Resolution, GenomeError> {
        let order = resolution_order(genome)?;
        self.advance_past(genome);
        self.record_known(genome);
        let mut resolution = Resolution::default();

        for index in order {
            let id = self
                .node_innovation_for(genome, index)?
                .ok_or(GenomeError::UnresolvableNodes(1))?;
            trace!("node {} resolved to innovation {}", index, id);
            genome
                .node_mut(index)
                .ok_or(GenomeError::NonexistentNode(index))?
                .resolve_id(id)?;
            resolution.nodes += 1;
        }

        let unnumbered: Vec<_> = genome
            .connections()
            .filter(|(_, c)| c.innovation().is_none())
            .map(|(i, c)| (i, c.endpoints()))
            .collect();
        for (index, (source, destination)) in unnumbered {
            let endpoints = (permanent_id(genome, source)?, permanent_id(genome, destination)?);
            let mut id = self.connection_innovation(endpoints);
            if genome.connection_by_innovation(id).is_some() {
                id = self.next_connection_innovation();
            }
            trace!("connection {} resolved to innovation {}", index, id);
            genome
                .connection_mut(index)
                .ok_or(GenomeError::NonexistentConnection(index))?
                .resolve_id(id)?;
            resolution.connections += 1;
        }

        debug!(
            "resolved {} node(s) and {} connection(s)",
            resolution.nodes, resolution.connections
        );
        Ok(resolution)
    }

    /// Returns the innovation number a provisional node should
    /// receive, or `None` if its parents are not yet permanent.
    fn node_innovation_for(
        &mut self,
        genome: &Genome,
        index: NodeIndex,
    ) -> Result<Option<Innovation>, GenomeError> {
        let node = genome.node(index).ok_or(GenomeError::NonexistentNode(index))?;
        if node.role() != NodeRole::Hidden {
            return Ok(Some(self.next_node_innovation()));
        }

        let parents = match permanent_pair(genome, node.parent_pair()?) {
            Some(parents) => parents,
            None => return Ok(None),
        };

        let id = self.node_innovation(parents);
        if genome.node_by_innovation(id).is_some() {
            debug!(
                "split of {:?} repeated within genome, issuing new node innovation",
                parents
            );
            Ok(Some(self.next_node_innovation()))
        } else {
            Ok(Some(id))
        }
    }

    /// Records the structure of every numbered gene of `genome`
    /// whose endpoints (or parents) are numbered as well.
    /// Existing records are kept.
    fn record_known(&mut self, genome: &Genome) {
        for (_, node) in genome.nodes() {
            let (id, parents) = match (node.innovation(), node.parent_pair()) {
                (Some(id), Ok(parents)) => (id, parents),
                _ => continue,
            };
            if let Some(parents) = permanent_pair(genome, parents) {
                self.node_innovations.entry(parents).or_insert(id);
            }
        }
        for connection in genome.connection_genes() {
            if let (Some(id), Some(endpoints)) =
                (connection.innovation(), permanent_pair(genome, connection.endpoints()))
            {
                self.connection_innovations.entry(endpoints).or_insert(id);
            }
        }
    }

    /// Moves both counters past every innovation number in `genome`.
    fn advance_past(&mut self, genome: &Genome) {
        if let Some(max) = genome.nodes().filter_map(|(_, n)| n.innovation()).max() {
            self.next_node_innovation = self.next_node_innovation.max(max + 1);
        }
        if let Some(max) = genome.connection_genes().filter_map(|c| c.innovation()).max() {
            self.next_connection_innovation = self.next_connection_innovation.max(max + 1);
        }
    }

    /// Returns the highest node innovation number issued, if any.
    pub fn max_node_innovation(&self) -> Option<Innovation> {
        self.next_node_innovation.checked_sub(1)
    }

    /// Returns the highest connection innovation number issued, if any.
    pub fn max_connection_innovation(&self) -> Option<Innovation> {
        self.next_connection_innovation.checked_sub(1)
    }

    /// Returns an iterator over the recorded node splits, in the
    /// format `((parent source, parent destination), node)`.
    /// No ordering is guaranteed.
    pub fn node_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.node_innovations.iter()
    }

    /// Returns an iterator over the recorded connections, in the
    /// format `((source, destination), connection)`.
    /// No ordering is guaranteed.
    pub fn connection_innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.connection_innovations.iter()
    }
}

/// Returns the provisional nodes of `genome` in an order that
/// resolves every hidden node after both its parents.
///
/// # Errors
/// Returns an error if some provisional node waits on a parent
/// that can never be resolved.
fn resolution_order(genome: &Genome) -> Result<Vec<NodeIndex>, GenomeError> {
    let mut resolved: Vec<bool> = genome.nodes().map(|(_, n)| !n.is_provisional()).collect();
    let mut pending: Vec<NodeIndex> = genome
        .nodes()
        .filter(|(_, n)| n.is_provisional())
        .map(|(i, _)| i)
        .collect();
    let mut order = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::new();
        for index in pending {
            let node = genome.node(index).ok_or(GenomeError::NonexistentNode(index))?;
            let ready = match node.role() {
                NodeRole::Hidden => {
                    let (source, destination) = node.parent_pair()?;
                    resolved.get(source.0) == Some(&true) && resolved.get(destination.0) == Some(&true)
                }
                _ => true,
            };
            if ready {
                resolved[index.0] = true;
                order.push(index);
            } else {
                waiting.push(index);
            }
        }
        if waiting.len() == before {
            return Err(GenomeError::UnresolvableNodes(waiting.len()));
        }
        pending = waiting;
    }

    Ok(order)
}

/// Returns the innovation numbers of a pair of nodes,
/// if both are permanent.
fn permanent_pair(
    genome: &Genome,
    (source, destination): (NodeIndex, NodeIndex),
) -> Option<(Innovation, Innovation)> {
    Some((
        genome.node(source)?.innovation()?,
        genome.node(destination)?.innovation()?,
    ))
}

fn permanent_id(genome: &Genome, node: NodeIndex) -> Result<Innovation, GenomeError> {
    genome
        .node(node)
        .ok_or(GenomeError::NonexistentNode(node))?
        .innovation()
        .ok_or(GenomeError::UnresolvedEndpoint(node))
}

/// An [`InnovationRegistry`] behind a mutex, for genomes built or
/// resolved on several threads. Clones share the same registry.
///
/// A panic while the registry is locked does not invalidate it:
/// counters are only ever advanced, so the registry stays usable.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry(Arc<Mutex<InnovationRegistry>>);

impl SharedRegistry {
    pub fn new(registry: InnovationRegistry) -> SharedRegistry {
        SharedRegistry(Arc::new(Mutex::new(registry)))
    }

    /// Resolves `genome` while holding the registry lock.
    /// See [`InnovationRegistry::resolve`].
    pub fn resolve(&self, genome: &mut Genome) -> Result<Resolution, GenomeError> {
        self.lock().resolve(genome)
    }

    pub fn next_node_innovation(&self) -> Innovation {
        self.lock().next_node_innovation()
    }

    pub fn next_connection_innovation(&self) -> Innovation {
        self.lock().next_connection_innovation()
    }

    /// Returns a copy of the registry's current state.
    pub fn snapshot(&self) -> InnovationRegistry {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, InnovationRegistry> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
