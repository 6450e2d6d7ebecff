use crate::genomics::ActivationType;

use serde::{Deserialize, Serialize};

/// Configuration data for gene creation
/// and genome comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Cached output of freshly created nodes, and the
    /// value they return to on activation reset.
    pub initial_activation: f32,
    /// Activation type of hidden nodes created by
    /// splitting a connection.
    pub hidden_activation: ActivationType,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the common gene weight average in genetic distance.
    pub common_weight_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration.
    /// All values are 0, and hidden nodes use
    /// [`Sigmoid`].
    ///
    /// # Note
    /// This value is meant as a way to fill in
    /// unused values during configuration instantiation.
    ///
    /// [`Sigmoid`]: crate::genomics::ActivationType::Sigmoid
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     excess_gene_factor: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert_eq!(config.disjoint_gene_factor, 0.0);
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            initial_activation: 0.0,
            hidden_activation: ActivationType::Sigmoid,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
        }
    }
}

impl Default for GeneticConfig {
    /// The compatibility coefficients used in the original
    /// NEAT experiments (c1 = c2 = 1.0, c3 = 0.4).
    fn default() -> GeneticConfig {
        GeneticConfig {
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            ..GeneticConfig::zero()
        }
    }
}
