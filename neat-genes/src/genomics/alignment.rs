use super::{AlignmentError, ConnectionGene, GeneticConfig};
use crate::Innovation;

use ahash::RandomState;

use std::collections::hash_map::{Entry, HashMap};
use std::fmt;

/// Identifies one of the two collections being aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => f.write_str("first"),
            Side::Second => f.write_str("second"),
        }
    }
}

/// Receives every position of an alignment as it is produced.
pub trait AlignmentObserver {
    fn observe(
        &mut self,
        innovation: Innovation,
        first: Option<&ConnectionGene>,
        second: Option<&ConnectionGene>,
    );
}

impl AlignmentObserver for () {
    fn observe(&mut self, _: Innovation, _: Option<&ConnectionGene>, _: Option<&ConnectionGene>) {}
}

/// Writes each aligned position to the `log` facade
/// as an `id | id` row, `-` marking an absent gene.
#[derive(Clone, Copy, Debug)]
pub struct LogObserver {
    pub level: log::Level,
}

impl Default for LogObserver {
    fn default() -> LogObserver {
        LogObserver {
            level: log::Level::Debug,
        }
    }
}

impl AlignmentObserver for LogObserver {
    fn observe(
        &mut self,
        innovation: Innovation,
        first: Option<&ConnectionGene>,
        second: Option<&ConnectionGene>,
    ) {
        log::log!(
            self.level,
            "{} | {}",
            first.map_or_else(|| "-".to_owned(), |_| innovation.to_string()),
            second.map_or_else(|| "-".to_owned(), |_| innovation.to_string()),
        );
    }
}

/// Two connection gene collections laid side by side
/// in ascending innovation order.
///
/// Both sides have the same length. At every position either
/// both sides hold a gene with the same innovation number
/// (a matching pair), or one side holds a gene and the other
/// holds `None` (a disjoint or excess gene).
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment<'a> {
    innovations: Vec<Innovation>,
    first: Vec<Option<&'a ConnectionGene>>,
    second: Vec<Option<&'a ConnectionGene>>,
}

/// Aligns the connection genes of two genomes by innovation number.
///
/// # Errors
/// Every gene must carry an innovation number, and no
/// innovation number may appear twice in the same collection.
///
/// # Examples
/// ```
/// use neat_genes::genomics::{align, ActivationType, ConnectionGene, Genome, NodeGene};
///
/// let mut genome = Genome::new();
/// let a = genome.add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0)).unwrap();
/// let b = genome.add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0)).unwrap();
/// let first = [1, 3, 5].map(|id| ConnectionGene::new(Some(id), a, b, 1.0, true));
/// let second = [2, 3, 4].map(|id| ConnectionGene::new(Some(id), a, b, 1.0, true));
///
/// let alignment = align(&first, &second).unwrap();
///
/// assert_eq!(alignment.innovations(), &[1, 2, 3, 4, 5]);
/// assert_eq!(alignment.to_string(), "1 | -\n- | 2\n3 | 3\n- | 4\n5 | -\n");
/// ```
pub fn align<'a, A, B>(first: A, second: B) -> Result<Alignment<'a>, AlignmentError>
where
    A: IntoIterator<Item = &'a ConnectionGene>,
    B: IntoIterator<Item = &'a ConnectionGene>,
{
    align_with(first, second, &mut ())
}

/// Aligns the connection genes of two genomes, reporting
/// each position to `observer` in ascending innovation order.
///
/// # Errors
/// See [`align`].
pub fn align_with<'a, A, B, O>(
    first: A,
    second: B,
    observer: &mut O,
) -> Result<Alignment<'a>, AlignmentError>
where
    A: IntoIterator<Item = &'a ConnectionGene>,
    B: IntoIterator<Item = &'a ConnectionGene>,
    O: AlignmentObserver + ?Sized,
{
    let first = keyed(first, Side::First)?;
    let second = keyed(second, Side::Second)?;

    let alignment = if is_strictly_ascending(&first) && is_strictly_ascending(&second) {
        Alignment::merge(first, second)
    } else {
        Alignment::by_union(first, second)?
    };

    for (id, first, second) in alignment.positions() {
        observer.observe(id, first, second);
    }

    Ok(alignment)
}

fn keyed<'a, I>(genes: I, side: Side) -> Result<Vec<(Innovation, &'a ConnectionGene)>, AlignmentError>
where
    I: IntoIterator<Item = &'a ConnectionGene>,
{
    genes
        .into_iter()
        .enumerate()
        .map(|(position, gene)| {
            gene.innovation()
                .map(|id| (id, gene))
                .ok_or(AlignmentError::UnresolvedIdentity { side, position })
        })
        .collect()
}

fn is_strictly_ascending(genes: &[(Innovation, &ConnectionGene)]) -> bool {
    genes.windows(2).all(|pair| pair[0].0 < pair[1].0)
}

impl<'a> Alignment<'a> {
    /// Merges two strictly ascending collections in linear time.
    fn merge(
        first: Vec<(Innovation, &'a ConnectionGene)>,
        second: Vec<(Innovation, &'a ConnectionGene)>,
    ) -> Alignment<'a> {
        let mut alignment = Alignment::with_capacity(first.len() + second.len());
        let mut first = first.into_iter().peekable();
        let mut second = second.into_iter().peekable();

        loop {
            let next = match (first.peek(), second.peek()) {
                (None, None) => break,
                (Some(&(a, _)), Some(&(b, _))) if a == b => {
                    (a, first.next().map(|e| e.1), second.next().map(|e| e.1))
                }
                (Some(&(a, _)), Some(&(b, _))) if a < b => (a, first.next().map(|e| e.1), None),
                (Some(&(a, _)), None) => (a, first.next().map(|e| e.1), None),
                (_, Some(&(b, _))) => (b, None, second.next().map(|e| e.1)),
            };
            alignment.push(next);
        }

        alignment
    }

    /// Aligns two collections in any order through
    /// the union of their innovation numbers.
    fn by_union(
        first: Vec<(Innovation, &'a ConnectionGene)>,
        second: Vec<(Innovation, &'a ConnectionGene)>,
    ) -> Result<Alignment<'a>, AlignmentError> {
        let first = Self::index(first, Side::First)?;
        let second = Self::index(second, Side::Second)?;

        let mut union: Vec<Innovation> = first.keys().chain(second.keys()).copied().collect();
        union.sort_unstable();
        union.dedup();

        let mut alignment = Alignment::with_capacity(union.len());
        for id in union {
            alignment.push((id, first.get(&id).copied(), second.get(&id).copied()));
        }

        Ok(alignment)
    }

    fn index(
        genes: Vec<(Innovation, &'a ConnectionGene)>,
        side: Side,
    ) -> Result<HashMap<Innovation, &'a ConnectionGene, RandomState>, AlignmentError> {
        let mut index = HashMap::with_capacity_and_hasher(genes.len(), RandomState::new());
        for (id, gene) in genes {
            match index.entry(id) {
                Entry::Occupied(_) => return Err(AlignmentError::DuplicateIdentity { side, id }),
                Entry::Vacant(entry) => {
                    entry.insert(gene);
                }
            }
        }
        Ok(index)
    }

    fn with_capacity(capacity: usize) -> Alignment<'a> {
        Alignment {
            innovations: Vec::with_capacity(capacity),
            first: Vec::with_capacity(capacity),
            second: Vec::with_capacity(capacity),
        }
    }

    fn push(
        &mut self,
        (id, first, second): (Innovation, Option<&'a ConnectionGene>, Option<&'a ConnectionGene>),
    ) {
        self.innovations.push(id);
        self.first.push(first);
        self.second.push(second);
    }

    /// Returns the number of aligned positions, which is the
    /// number of distinct innovation numbers in both collections.
    pub fn len(&self) -> usize {
        self.innovations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.innovations.is_empty()
    }

    /// Returns the innovation number of every position, ascending.
    pub fn innovations(&self) -> &[Innovation] {
        &self.innovations
    }

    /// Returns the aligned genes of the first collection.
    pub fn first(&self) -> &[Option<&'a ConnectionGene>] {
        &self.first
    }

    /// Returns the aligned genes of the second collection.
    pub fn second(&self) -> &[Option<&'a ConnectionGene>] {
        &self.second
    }

    /// Returns an iterator over `(innovation, first, second)` positions.
    pub fn positions(
        &self,
    ) -> impl Iterator<Item = (Innovation, Option<&'a ConnectionGene>, Option<&'a ConnectionGene>)> + '_
    {
        self.innovations
            .iter()
            .zip(self.first.iter().zip(self.second.iter()))
            .map(|(&id, (&first, &second))| (id, first, second))
    }

    /// Returns an iterator over the matching gene pairs.
    pub fn matching(&self) -> impl Iterator<Item = (&'a ConnectionGene, &'a ConnectionGene)> + '_ {
        self.positions().filter_map(|(_, first, second)| first.zip(second))
    }

    /// Consumes the alignment, returning its two sides.
    pub fn into_sides(self) -> (Vec<Option<&'a ConnectionGene>>, Vec<Option<&'a ConnectionGene>>) {
        (self.first, self.second)
    }

    /// Returns the same alignment with the sides exchanged.
    pub fn swapped(&self) -> Alignment<'a> {
        Alignment {
            innovations: self.innovations.clone(),
            first: self.second.clone(),
            second: self.first.clone(),
        }
    }

    /// Counts matching, disjoint and excess genes and averages
    /// the weight differences of matching pairs.
    ///
    /// A gene present on only one side is _excess_ if its innovation
    /// number is greater than every innovation number of the other
    /// side, and _disjoint_ otherwise.
    pub fn stats(&self) -> AlignmentStats {
        let last_first = self.last_innovation(&self.first);
        let last_second = self.last_innovation(&self.second);
        let is_excess = |id: Innovation, other_last: Option<Innovation>| other_last.map_or(true, |last| id > last);

        let mut stats = AlignmentStats::default();
        let mut weight_difference = 0.0;
        for (id, first, second) in self.positions() {
            match (first, second) {
                (Some(a), Some(b)) => {
                    stats.matching += 1;
                    weight_difference += (a.weight() - b.weight()).abs();
                }
                (Some(_), None) if is_excess(id, last_second) => stats.excess_first += 1,
                (Some(_), None) => stats.disjoint_first += 1,
                (None, Some(_)) if is_excess(id, last_first) => stats.excess_second += 1,
                (None, Some(_)) => stats.disjoint_second += 1,
                (None, None) => {}
            }
        }
        if stats.matching > 0 {
            stats.mean_weight_difference = weight_difference / stats.matching as f32;
        }
        stats
    }

    fn last_innovation(&self, side: &[Option<&ConnectionGene>]) -> Option<Innovation> {
        self.innovations
            .iter()
            .zip(side)
            .rev()
            .find(|(_, gene)| gene.is_some())
            .map(|(&id, _)| id)
    }

    /// Calculates the _genetic distance_ between the two sides,
    /// weighting gene and weight differences as specified in `config`.
    ///
    /// # Examples
    /// ```
    /// use neat_genes::genomics::{align, ActivationType, ConnectionGene, GeneticConfig, Genome, NodeGene};
    ///
    /// const EXCESS_FACTOR: f32 = 1.5;
    /// const DISJOINT_FACTOR: f32 = 0.5;
    /// const WEIGHT_FACTOR: f32 = 0.25;
    ///
    /// let config = GeneticConfig {
    ///     excess_gene_factor: EXCESS_FACTOR,
    ///     disjoint_gene_factor: DISJOINT_FACTOR,
    ///     common_weight_factor: WEIGHT_FACTOR,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let mut genome = Genome::new();
    /// let a = genome.add_node(NodeGene::input(Some(0), ActivationType::Identity.into(), 0.0)).unwrap();
    /// let b = genome.add_node(NodeGene::output(Some(1), ActivationType::Sigmoid.into(), 0.0)).unwrap();
    ///
    /// let first = [
    ///     ConnectionGene::new(Some(0), a, b, 1.0, true),   // common, weight difference 2.0
    ///     ConnectionGene::new(Some(1), a, b, 3.0, true),   // disjoint
    ///     ConnectionGene::new(Some(3), a, b, 1.0, true),   // common, weight difference 0.0
    ///     ConnectionGene::new(Some(4), a, b, 3.0, true),   // excess
    /// ];
    /// let second = [
    ///     ConnectionGene::new(Some(0), a, b, -1.0, true),
    ///     ConnectionGene::new(Some(2), a, b, 1.0, true),   // disjoint
    ///     ConnectionGene::new(Some(3), a, b, 1.0, true),
    /// ];
    ///
    /// let alignment = align(&first, &second).unwrap();
    /// assert_eq!(
    ///     alignment.genetic_distance(&config),
    ///     DISJOINT_FACTOR * 2.0 + EXCESS_FACTOR * 1.0 + WEIGHT_FACTOR * (2.0 + 0.0) / 2.0
    /// );
    /// ```
    pub fn genetic_distance(&self, config: &GeneticConfig) -> f32 {
        let stats = self.stats();
        config.excess_gene_factor * stats.excess() as f32
            + config.disjoint_gene_factor * stats.disjoint() as f32
            + config.common_weight_factor * stats.mean_weight_difference
    }
}

impl fmt::Display for Alignment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |id: Innovation, gene: Option<&ConnectionGene>| {
            gene.map_or_else(|| "-".to_owned(), |_| id.to_string())
        };
        for (id, first, second) in self.positions() {
            writeln!(f, "{} | {}", cell(id, first), cell(id, second))?;
        }
        Ok(())
    }
}

/// Gene counts of an [`Alignment`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AlignmentStats {
    /// Positions holding a gene on both sides.
    pub matching: usize,
    /// Disjoint genes of the first side.
    pub disjoint_first: usize,
    /// Disjoint genes of the second side.
    pub disjoint_second: usize,
    /// Excess genes of the first side.
    pub excess_first: usize,
    /// Excess genes of the second side.
    pub excess_second: usize,
    /// Mean absolute weight difference of matching pairs,
    /// or 0 if there are none.
    pub mean_weight_difference: f32,
}

impl AlignmentStats {
    pub fn disjoint(&self) -> usize {
        self.disjoint_first + self.disjoint_second
    }

    pub fn excess(&self) -> usize {
        self.excess_first + self.excess_second
    }
}
