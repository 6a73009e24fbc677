use crate::Coord;
use crate::Weight;
use anyhow::ensure;
use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;

/// A symmetric, zero-diagonal dissimilarity matrix over `[0, n)`.
///
/// Stored densely (row-major) rather than packed upper-triangular: the
/// instances this solver targets are small enough (propagation is already
/// the bottleneck well before memory is) that the simpler representation
/// wins over a cleverer packed layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dissimilarity {
    n: usize,
    data: Vec<Weight>,
}

impl Dissimilarity {
    pub fn from_rows(rows: Vec<Vec<Weight>>) -> Self {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            data.extend(row);
        }
        Self { n, data }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Weight {
        debug_assert!(i < self.n && j < self.n);
        self.data[i * self.n + j]
    }

    pub fn n(&self) -> usize {
        self.n
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.data.len() == self.n * self.n,
            "dissimilarity matrix is not n x n ({} entries, n = {})",
            self.data.len(),
            self.n
        );
        for i in 0..self.n {
            ensure!(
                self.get(i, i) == 0.0,
                "dissimilarity matrix has nonzero diagonal at {i}"
            );
            for j in (i + 1)..self.n {
                let dij = self.get(i, j);
                let dji = self.get(j, i);
                ensure!(
                    dij.is_finite() && dij >= 0.0,
                    "dissimilarity[{i}][{j}] = {dij} is not finite and nonnegative"
                );
                ensure!(
                    (dij - dji).abs() <= 1e-9 * dij.abs().max(1.0),
                    "dissimilarity matrix is not symmetric at ({i}, {j}): {dij} != {dji}"
                );
            }
        }
        Ok(())
    }
}

/// Immutable problem instance: observation count, cluster count, optional
/// feature count, the dissimilarity matrix, and the optional coordinate
/// matrix / target cardinalities / initial membership vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    n: usize,
    k: usize,
    s: Option<usize>,
    dissimilarity: Dissimilarity,
    coords: Option<Vec<Vec<Coord>>>,
    target: Option<Vec<usize>>,
    memberships: Option<Vec<usize>>,
}

impl Instance {
    pub fn new(
        k: usize,
        dissimilarity: Dissimilarity,
        coords: Option<Vec<Vec<Coord>>>,
        target: Option<Vec<usize>>,
        memberships: Option<Vec<usize>>,
    ) -> anyhow::Result<Self> {
        let n = dissimilarity.n();
        let s = coords.as_ref().and_then(|c| c.first()).map(|row| row.len());
        let instance = Self {
            n,
            k,
            s,
            dissimilarity,
            coords,
            target,
            memberships,
        };
        instance.validate()?;
        Ok(instance)
    }

    pub fn n(&self) -> usize {
        self.n
    }
    pub fn k(&self) -> usize {
        self.k
    }
    pub fn s(&self) -> Option<usize> {
        self.s
    }
    #[inline]
    pub fn d(&self, i: usize, j: usize) -> Weight {
        self.dissimilarity.get(i, j)
    }
    pub fn coord(&self, i: usize) -> Option<&[Coord]> {
        self.coords.as_deref().map(|c| c[i].as_slice())
    }
    pub fn has_coords(&self) -> bool {
        self.coords.is_some()
    }
    pub fn target(&self, c: usize) -> Option<usize> {
        self.target.as_ref().map(|t| t[c])
    }
    pub fn targets(&self) -> Option<&[usize]> {
        self.target.as_deref()
    }
    pub fn membership(&self, i: usize) -> Option<usize> {
        self.memberships.as_ref().map(|m| m[i])
    }
    pub fn memberships(&self) -> Option<&[usize]> {
        self.memberships.as_deref()
    }

    /// Clones this instance with its initial membership vector replaced,
    /// re-validating the result. Used to seed a re-solve from a prior
    /// solve's assignment (e.g. confirming no strictly better `V*` exists).
    pub fn with_memberships(&self, memberships: Vec<usize>) -> anyhow::Result<Self> {
        let instance = Self {
            memberships: Some(memberships),
            ..self.clone()
        };
        instance.validate()?;
        Ok(instance)
    }

    /// Enforces the instance's structural invariants: malformed `D`,
    /// `Σ target != N`, non-positive target cardinalities, out-of-range
    /// memberships. Surfaced to the embedding program at posting time,
    /// never discovered mid-search.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.k > 0, "k must be positive");
        ensure!(self.k <= self.n, "k ({}) must be <= n ({})", self.k, self.n);
        self.dissimilarity
            .validate()
            .context("dissimilarity matrix failed validation")?;
        if let Some(target) = &self.target {
            ensure!(
                target.len() == self.k,
                "target cardinality vector has {} entries, expected k = {}",
                target.len(),
                self.k
            );
            ensure!(
                target.iter().all(|&t| t > 0),
                "every target cardinality must be positive"
            );
            let sum: usize = target.iter().sum();
            ensure!(
                sum == self.n,
                "target cardinalities sum to {sum}, expected n = {}",
                self.n
            );
        }
        if let Some(coords) = &self.coords {
            ensure!(
                coords.len() == self.n,
                "coordinate matrix has {} rows, expected n = {}",
                coords.len(),
                self.n
            );
            let s = self.s.unwrap_or(0);
            ensure!(
                coords.iter().all(|row| row.len() == s),
                "coordinate matrix rows have inconsistent feature counts"
            );
        }
        if let Some(memberships) = &self.memberships {
            ensure!(
                memberships.len() == self.n,
                "membership vector has {} entries, expected n = {}",
                memberships.len(),
                self.n
            );
            ensure!(
                memberships.iter().all(|&c| c < self.k),
                "membership vector references a cluster index >= k"
            );
        }
        Ok(())
    }
}
