//! # neat-genes
//! The genetic encoding layer of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Provides node and connection genes stored in a per-genome arena,
//! an [`InnovationRegistry`] that assigns equal innovation numbers to
//! equal structural mutations of different genomes, and the [`align`]
//! function which lays two genomes' connection genes side by side
//! for crossover and genetic distance calculations.
//!
//! Population management, mutation operators and network evaluation
//! are left to the user.
//!
//! [`InnovationRegistry`]: crate::genomics::InnovationRegistry
//! [`align`]: crate::genomics::align
//!
//! # Example usage: aligning two genomes after a shared mutation
//! ```
//! use neat_genes::genomics::{
//!     align, ActivationType, ConnectionGene, GeneticConfig, Genome, InnovationRegistry, NodeGene,
//! };
//!
//! let config = GeneticConfig::default();
//! // Node innovations 0 to 2 and connection innovations 0 and 1 are taken.
//! let mut registry = InnovationRegistry::starting_at(3, 2);
//!
//! let mut parent1 = Genome::new();
//! let a = parent1.add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0)).unwrap();
//! let b = parent1.add_node(NodeGene::input(Some(1), ActivationType::Identity.into(), 0.0)).unwrap();
//! let out = parent1.add_node(NodeGene::output(Some(2), ActivationType::Sigmoid.into(), 0.0)).unwrap();
//! let a_out = parent1.add_connection(ConnectionGene::new(Some(0), a, out, 0.5, true)).unwrap();
//! parent1.add_connection(ConnectionGene::new(Some(1), b, out, -0.5, true)).unwrap();
//!
//! let mut parent2 = parent1.clone();
//!
//! // The same connection is split in both genomes...
//! parent1.split_connection(a_out, &config).unwrap();
//! parent2.split_connection(a_out, &config).unwrap();
//! registry.resolve(&mut parent1).unwrap();
//! registry.resolve(&mut parent2).unwrap();
//!
//! // ...so every gene has a homologous counterpart.
//! let alignment = align(parent1.connection_genes(), parent2.connection_genes()).unwrap();
//! assert_eq!(alignment.len(), 4);
//! assert_eq!(alignment.stats().matching, 4);
//! assert_eq!(alignment.genetic_distance(&config), 0.0);
//! ```

pub mod genomics;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;
