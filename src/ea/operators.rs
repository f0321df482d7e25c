//! Crossover and mutation operators.
//!
//! [`Crossover`] and [`Mutation`] are the operator contracts that
//! reproduction strategies compose. This module also ships generic
//! permutation operators working on `Vec<usize>` index vectors holding
//! `0..n`: scheduling, TSP, and any permutation problem can use them.
//!
//! # Crossover Operators
//!
//! - [`order_crossover`] (OX): Davis (1985) — preserves relative order
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985) — preserves absolute position
//! - [`cycle_crossover`] (CX): Oliver et al. (1987) — every gene keeps a parent's position
//!
//! # Mutation Operators
//!
//! - [`swap_mutation`]: Exchange two distinct random positions — O(1)
//! - [`insert_mutation`]: Remove and reinsert at random position — O(n)
//! - [`invert_mutation`]: Reverse a random segment (2-opt) — O(n)
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Oliver, Smith & Holland (1987), "A Study of Permutation Crossover
//!   Operators on the Traveling Salesman Problem"
//! - Cicirello (2023), "Genetic Operators for Permutation Representation"

use crate::error::EaError;
use rand::seq::index;
use rand::{Rng, RngCore};

/// Recombines two parent genotypes.
pub trait Crossover<G> {
    /// Produces one or two children of the same representation.
    fn crossover(
        &self,
        parent1: &G,
        parent2: &G,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<G>, EaError>;
}

/// Perturbs a genotype in place.
///
/// The result keeps the representation (length, alphabet, permutation
/// validity) of the input.
pub trait Mutation<G> {
    /// Mutates `genotype`.
    fn mutate(&self, genotype: &mut G, rng: &mut dyn RngCore) -> Result<(), EaError>;
}

// ============================================================================
// Operator strategies
// ============================================================================

/// Crossover that returns unchanged copies of both parents.
///
/// Useful as a baseline and for isolating the effect of mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityCrossover;

impl<G: Clone> Crossover<G> for IdentityCrossover {
    fn crossover(
        &self,
        parent1: &G,
        parent2: &G,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<G>, EaError> {
        Ok(vec![parent1.clone(), parent2.clone()])
    }
}

/// [`order_crossover`] as a [`Crossover`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderCrossover;

impl Crossover<Vec<usize>> for OrderCrossover {
    fn crossover(
        &self,
        parent1: &Vec<usize>,
        parent2: &Vec<usize>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Vec<usize>>, EaError> {
        let (c1, c2) = order_crossover(parent1, parent2, rng)?;
        Ok(vec![c1, c2])
    }
}

/// [`pmx_crossover`] as a [`Crossover`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartiallyMappedCrossover;

impl Crossover<Vec<usize>> for PartiallyMappedCrossover {
    fn crossover(
        &self,
        parent1: &Vec<usize>,
        parent2: &Vec<usize>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Vec<usize>>, EaError> {
        let (c1, c2) = pmx_crossover(parent1, parent2, rng)?;
        Ok(vec![c1, c2])
    }
}

/// [`cycle_crossover`] as a [`Crossover`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleCrossover;

impl Crossover<Vec<usize>> for CycleCrossover {
    fn crossover(
        &self,
        parent1: &Vec<usize>,
        parent2: &Vec<usize>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Vec<usize>>, EaError> {
        let (c1, c2) = cycle_crossover(parent1, parent2)?;
        Ok(vec![c1, c2])
    }
}

/// [`swap_mutation`] as a [`Mutation`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapMutation;

impl<T> Mutation<Vec<T>> for SwapMutation {
    fn mutate(&self, genotype: &mut Vec<T>, rng: &mut dyn RngCore) -> Result<(), EaError> {
        swap_mutation(genotype, rng);
        Ok(())
    }
}

/// [`invert_mutation`] as a [`Mutation`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InversionMutation;

impl<T> Mutation<Vec<T>> for InversionMutation {
    fn mutate(&self, genotype: &mut Vec<T>, rng: &mut dyn RngCore) -> Result<(), EaError> {
        invert_mutation(genotype, rng);
        Ok(())
    }
}

/// [`insert_mutation`] as a [`Mutation`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertMutation;

impl<T> Mutation<Vec<T>> for InsertMutation {
    fn mutate(&self, genotype: &mut Vec<T>, rng: &mut dyn RngCore) -> Result<(), EaError> {
        insert_mutation(genotype, rng);
        Ok(())
    }
}

// ============================================================================
// Crossover operators
// ============================================================================

/// Order Crossover (OX) for permutations.
///
/// Preserves the **relative order** of elements from both parents.
///
/// # Algorithm (Davis, 1985)
///
/// 1. Select a random segment `[start, end]` from parent1
/// 2. Copy segment to child at the same positions
/// 3. Fill remaining positions with elements from parent2, in their original
///    order, skipping elements already present in the child
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Errors
/// [`EaError::Representation`] if the parents are empty, differ in length,
/// or are not permutations of `0..n`.
pub fn order_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>), EaError> {
    let n = check_permutation_parents(parent1, parent2)?;

    if n == 1 {
        return Ok((parent1.to_vec(), parent2.to_vec()));
    }

    let (start, end) = random_segment(n, rng);

    let child1 = ox_build_child(parent1, parent2, start, end);
    let child2 = ox_build_child(parent2, parent1, start, end);

    Ok((child1, child2))
}

/// Build one OX child: copy segment from `template`, fill from `donor`.
fn ox_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut in_segment = vec![false; n];

    for i in start..=end {
        child[i] = template[i];
        in_segment[template[i]] = true;
    }

    // Fill from donor, starting after segment end, wrapping around
    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let val = donor[(end + 1 + offset) % n];
        if !in_segment[val] {
            child[pos] = val;
            pos = (pos + 1) % n;
        }
    }

    child
}

/// Partially Mapped Crossover (PMX) for permutations.
///
/// Preserves the **absolute position** of elements from both parents
/// as much as possible.
///
/// # Algorithm (Goldberg & Lingle, 1985)
///
/// 1. Select a random segment `[start, end]` from parent1
/// 2. Copy segment to child at the same positions
/// 3. For each element in parent2's segment that isn't in the child yet,
///    find its position through the mapping chain and place it there
/// 4. Fill remaining positions from parent2
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Errors
/// [`EaError::Representation`] if the parents are empty, differ in length,
/// or are not permutations of `0..n`.
pub fn pmx_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>), EaError> {
    let n = check_permutation_parents(parent1, parent2)?;

    if n == 1 {
        return Ok((parent1.to_vec(), parent2.to_vec()));
    }

    let (start, end) = random_segment(n, rng);

    let child1 = pmx_build_child(parent1, parent2, start, end);
    let child2 = pmx_build_child(parent2, parent1, start, end);

    Ok((child1, child2))
}

/// Build one PMX child: copy segment from `template`, map from `donor`.
fn pmx_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let sentinel = usize::MAX;
    let mut child = vec![sentinel; n];
    let mut placed = vec![false; n];

    let mut donor_pos = vec![0usize; n];
    for (i, &v) in donor.iter().enumerate() {
        donor_pos[v] = i;
    }

    for i in start..=end {
        child[i] = template[i];
        placed[template[i]] = true;
    }

    // Donor segment values not yet placed follow the mapping chain
    // until they land outside the segment.
    for i in start..=end {
        let donor_val = donor[i];
        if placed[donor_val] {
            continue;
        }
        let mut pos = i;
        loop {
            let target = donor_pos[template[pos]];
            if target < start || target > end {
                child[target] = donor_val;
                placed[donor_val] = true;
                break;
            }
            pos = target;
        }
    }

    for i in 0..n {
        if child[i] == sentinel {
            child[i] = donor[i];
        }
    }

    child
}

/// Cycle Crossover (CX) for permutations.
///
/// Splits the positions into cycles shared by both parents. Odd cycles
/// are copied from parent1 into child1 (parent2 into child2), even
/// cycles the other way round, so every gene keeps the absolute
/// position it has in one of the parents.
///
/// Deterministic: needs no random source.
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Errors
/// [`EaError::Representation`] if the parents are empty, differ in length,
/// or are not permutations of `0..n`.
pub fn cycle_crossover(
    parent1: &[usize],
    parent2: &[usize],
) -> Result<(Vec<usize>, Vec<usize>), EaError> {
    let n = check_permutation_parents(parent1, parent2)?;

    let mut p2_pos = vec![0usize; n];
    for (i, &v) in parent2.iter().enumerate() {
        p2_pos[v] = i;
    }

    let mut child1 = vec![0usize; n];
    let mut child2 = vec![0usize; n];
    let mut visited = vec![false; n];
    let mut odd_cycle = true;

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut pos = start;
        while !visited[pos] {
            visited[pos] = true;
            if odd_cycle {
                child1[pos] = parent1[pos];
                child2[pos] = parent2[pos];
            } else {
                child1[pos] = parent2[pos];
                child2[pos] = parent1[pos];
            }
            pos = p2_pos[parent1[pos]];
        }
        odd_cycle = !odd_cycle;
    }

    Ok((child1, child2))
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Swap mutation: exchange two distinct random positions.
///
/// # Complexity
/// O(1)
pub fn swap_mutation<T, R: Rng + ?Sized>(genes: &mut [T], rng: &mut R) {
    let n = genes.len();
    if n < 2 {
        return;
    }
    let picked = index::sample(rng, n, 2);
    genes.swap(picked.index(0), picked.index(1));
}

/// Insert mutation: remove an element and reinsert at a random position.
///
/// Equivalent to a single "insert" move in local search.
///
/// # Complexity
/// O(n) due to array shifting
pub fn insert_mutation<T, R: Rng + ?Sized>(genes: &mut Vec<T>, rng: &mut R) {
    let n = genes.len();
    if n < 2 {
        return;
    }
    let from = rng.random_range(0..n);
    let item = genes.remove(from);
    let to = rng.random_range(0..n); // n-1 elements, but 0..n insertion points
    genes.insert(to, item);
}

/// Invert mutation: reverse a random segment (2-opt move).
///
/// # Complexity
/// O(n) worst case for segment reversal
pub fn invert_mutation<T, R: Rng + ?Sized>(genes: &mut [T], rng: &mut R) {
    let n = genes.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    genes[start..=end].reverse();
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns `true` if `genes` holds every value of `0..genes.len()` exactly once.
pub fn is_permutation(genes: &[usize]) -> bool {
    let n = genes.len();
    let mut seen = vec![false; n];
    for &v in genes {
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Checks two crossover parents and returns their common length.
fn check_permutation_parents(parent1: &[usize], parent2: &[usize]) -> Result<usize, EaError> {
    let n = parent1.len();
    if n != parent2.len() {
        return Err(EaError::representation(format!(
            "parents must have equal length, got {} and {}",
            n,
            parent2.len()
        )));
    }
    if n == 0 {
        return Err(EaError::representation("parents must not be empty"));
    }
    if !is_permutation(parent1) || !is_permutation(parent2) {
        return Err(EaError::representation(format!(
            "parents must be permutations of 0..{n}"
        )));
    }
    Ok(n)
}

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================
