use neat_genes::genomics::{
    align_with, ActivationType, ConnectionGene, GeneticConfig, Genome, InnovationRegistry,
    LogObserver, NodeGene, SharedRegistry,
};

use std::error::Error;

use log::{info, LevelFilter};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::Deserialize;

const CONFIG: &str = r#"(
    siblings: 8,
    weight_bound: 2.0,
    genetic: (
        initial_activation: 0.0,
        hidden_activation: Sigmoid,
        excess_gene_factor: 1.0,
        disjoint_gene_factor: 1.0,
        common_weight_factor: 0.4,
    ),
)"#;

#[derive(Deserialize)]
struct DemoConfig {
    siblings: usize,
    weight_bound: f32,
    genetic: GeneticConfig,
}

/// Builds a fully connected genome with a bias node,
/// two inputs and one output.
fn base_genome(weight_bound: f32) -> Result<Genome, Box<dyn Error>> {
    let mut rng = rand::thread_rng();
    let mut genome = Genome::new();
    let sources = [
        genome.add_node(NodeGene::bias(Some(0), ActivationType::Identity.into(), 1.0))?,
        genome.add_node(NodeGene::input(Some(1), ActivationType::Identity.into(), 0.0))?,
        genome.add_node(NodeGene::input(Some(2), ActivationType::Identity.into(), 0.0))?,
    ];
    let output = genome.add_node(NodeGene::output(Some(3), ActivationType::Sigmoid.into(), 0.0))?;
    for (id, &source) in sources.iter().enumerate() {
        let weight = rng.gen_range(-weight_bound..=weight_bound);
        genome.add_connection(ConnectionGene::new(Some(id), source, output, weight, true))?;
    }
    Ok(genome)
}

/// Splits a random enabled connection of a copy of `base`
/// and perturbs every weight, then numbers the new genes.
fn mutated_sibling(
    base: &Genome,
    registry: &SharedRegistry,
    config: &DemoConfig,
) -> Result<Genome, Box<dyn Error + Send + Sync>> {
    let mut rng = rand::thread_rng();
    let mut genome = base.clone();

    let enabled: Vec<_> = genome
        .connections()
        .filter(|(_, c)| c.enabled())
        .map(|(i, _)| i)
        .collect();
    if let Some(&split) = enabled.choose(&mut rng) {
        genome.split_connection(split, &config.genetic)?;
    }

    let indices: Vec<_> = genome.connections().map(|(i, _)| i).collect();
    for index in indices {
        if let Some(connection) = genome.connection_mut(index) {
            let nudge = rng.gen_range(-0.1f32..=0.1) * config.weight_bound;
            connection.set_weight(connection.weight() + nudge);
        }
    }

    registry.resolve(&mut genome)?;
    Ok(genome)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let config: DemoConfig = ron::from_str(CONFIG)?;
    let base = base_genome(config.weight_bound)?;
    info!("base genome: {}", base);

    // Node innovations 0 to 3 and connection innovations 0 to 2 are in use.
    let registry = SharedRegistry::new(InnovationRegistry::starting_at(4, 3));
    let siblings = (0..config.siblings)
        .into_par_iter()
        .map(|_| mutated_sibling(&base, &registry, &config))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e as Box<dyn Error>)?;

    let snapshot = registry.snapshot();
    info!(
        "{} sibling(s) resolved, {} distinct split(s) recorded",
        siblings.len(),
        snapshot.node_innovation_history().count()
    );

    let reference = match siblings.first() {
        Some(reference) => reference,
        None => return Ok(()),
    };
    println!("{}", reference);
    for (i, sibling) in siblings.iter().enumerate().skip(1) {
        let alignment = align_with(
            reference.connection_genes(),
            sibling.connection_genes(),
            &mut LogObserver::default(),
        )?;
        if i == 1 {
            print!("{}", alignment);
        }
        let stats = alignment.stats();
        println!(
            "sibling {}: {} matching, {} disjoint, {} excess, distance {:.3}",
            i,
            stats.matching,
            stats.disjoint(),
            stats.excess(),
            alignment.genetic_distance(&config.genetic)
        );
    }

    let saved = ron::to_string(reference)?;
    let restored: Genome = ron::from_str(&saved)?;
    info!("genome survives a RON round trip: {}", &restored == reference);
    Ok(())
}
