use ns_core::Replica;

/// The current population of replicas, kept sorted ascending by energy.
/// Cardinality is constant across iterations; callers hand back exactly
/// as many replicas as [`LiveSet::replace_top_k`] removes.
pub struct LiveSet {
    replicas: Vec<Replica>,
}

impl LiveSet {
    /// Build a live set from an initial population, sorting it ascending.
    pub fn new(replicas: Vec<Replica>) -> Self {
        let mut set = Self { replicas };
        set.sort();
        set
    }

    fn sort(&mut self) {
        self.replicas
            .sort_by(|a, b| a.e.partial_cmp(&b.e).expect("non-finite energy in live set"));
    }

    /// Number of replicas currently held.
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Lowest energy currently in the live set.
    pub fn min_e(&self) -> f64 {
        self.replicas[0].e
    }

    /// Highest energy currently in the live set.
    pub fn max_e(&self) -> f64 {
        self.replicas[self.replicas.len() - 1].e
    }

    /// `E_cut`: the energy of the lowest of the `k` highest-energy replicas.
    pub fn cutoff(&self, k: usize) -> f64 {
        self.replicas[self.replicas.len() - k].e
    }

    /// The `k` highest energies, ascending, the ones discarded this
    /// iteration.
    pub fn discarded_top_k(&self, k: usize) -> Vec<f64> {
        self.replicas[self.replicas.len() - k..]
            .iter()
            .map(|r| r.e)
            .collect()
    }

    /// The `N - k` surviving replicas, i.e. everything except the top `k`.
    pub fn survivors(&self, k: usize) -> &[Replica] {
        &self.replicas[..self.replicas.len() - k]
    }

    /// Remove the top `k` replicas and replace them with `replacements`,
    /// then re-sort. `replacements.len()` must equal `k`.
    pub fn replace_top_k(&mut self, k: usize, replacements: Vec<Replica>) {
        debug_assert_eq!(replacements.len(), k);
        let keep = self.replicas.len() - k;
        self.replicas.truncate(keep);
        self.replicas.extend(replacements);
        self.sort();
    }

    /// Final live-set energies at termination, ascending.
    pub fn energies_ascending(&self) -> Vec<f64> {
        self.replicas.iter().map(|r| r.e).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(e: f64) -> Replica {
        Replica::new(vec![e], e)
    }

    #[test]
    fn new_sorts_ascending() {
        let set = LiveSet::new(vec![replica(3.0), replica(1.0), replica(2.0)]);
        assert_eq!(set.energies_ascending(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn cutoff_and_discarded_match_top_k() {
        let set = LiveSet::new(vec![replica(1.0), replica(2.0), replica(3.0), replica(4.0)]);
        assert_eq!(set.cutoff(2), 3.0);
        assert_eq!(set.discarded_top_k(2), vec![3.0, 4.0]);
        assert_eq!(set.survivors(2).len(), 2);
    }

    #[test]
    fn replace_top_k_keeps_cardinality_and_resorts() {
        let mut set = LiveSet::new(vec![replica(1.0), replica(2.0), replica(3.0), replica(4.0)]);
        set.replace_top_k(2, vec![replica(0.5), replica(1.5)]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.energies_ascending(), vec![0.5, 1.0, 1.5, 2.0]);
    }
}
