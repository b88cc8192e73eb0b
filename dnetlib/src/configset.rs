//! Families of configurations bound to their network.
use crate::network::{Configuration, Network};
use crate::zdd::Zdd;
use crate::DnetError;

use rand::Rng;
use std::collections::BTreeMap;

/// A family of configurations of one network.
///
/// Combining families of networks with different topologies is a programming error and panics.
#[derive(Clone, Debug)]
pub struct ConfigSet<'a> {
    network: &'a Network,
    family: Zdd,
}

impl<'a> ConfigSet<'a> {
    pub fn new(network: &'a Network, family: Zdd) -> Self {
        assert_eq!(
            family.num_vars(),
            network.switches().len(),
            "family must have one variable per switch"
        );
        ConfigSet { network, family }
    }

    /// The family containing only the configuration with every switch open.
    pub fn all_open(network: &'a Network) -> Self {
        ConfigSet::new(network, Zdd::base(network.switches().len()))
    }

    #[inline]
    pub fn network(&self) -> &'a Network {
        self.network
    }

    #[inline]
    pub fn family(&self) -> &Zdd {
        &self.family
    }

    /// Number of configurations.
    pub fn len(&self) -> u128 {
        self.family.count()
    }

    pub fn is_empty(&self) -> bool {
        self.family.is_empty()
    }

    fn check_topology(&self, other: &ConfigSet) {
        assert!(
            self.network.has_same_topology(other.network),
            "configuration sets belong to networks with different topologies"
        );
    }

    fn with_family(&self, family: Zdd) -> ConfigSet<'a> {
        ConfigSet {
            network: self.network,
            family,
        }
    }

    pub fn union(&self, other: &ConfigSet) -> ConfigSet<'a> {
        self.check_topology(other);
        self.with_family(self.family.union(&other.family))
    }

    pub fn intersection(&self, other: &ConfigSet) -> ConfigSet<'a> {
        self.check_topology(other);
        self.with_family(self.family.intersection(&other.family))
    }

    pub fn difference(&self, other: &ConfigSet) -> ConfigSet<'a> {
        self.check_topology(other);
        self.with_family(self.family.difference(&other.family))
    }

    pub fn symmetric_difference(&self, other: &ConfigSet) -> ConfigSet<'a> {
        self.check_topology(other);
        let left = self.family.difference(&other.family);
        let right = other.family.difference(&self.family);
        self.with_family(left.union(&right))
    }

    /// Returns true if every configuration of `self` is in `other`.
    pub fn is_subset(&self, other: &ConfigSet) -> bool {
        self.check_topology(other);
        self.family.difference(&other.family).is_empty()
    }

    pub fn is_superset(&self, other: &ConfigSet) -> bool {
        other.is_subset(self)
    }

    pub fn is_disjoint(&self, other: &ConfigSet) -> bool {
        self.check_topology(other);
        self.family.intersection(&other.family).is_empty()
    }

    /// Configurations where the named switch is closed.
    pub fn including(&self, switch: &str) -> Result<ConfigSet<'a>, DnetError> {
        let s = self.network.switch_index(switch)?;
        Ok(self.with_family(self.family.including(s + 1)))
    }

    /// Configurations where the named switch is open.
    pub fn excluding(&self, switch: &str) -> Result<ConfigSet<'a>, DnetError> {
        let s = self.network.switch_index(switch)?;
        Ok(self.with_family(self.family.excluding(s + 1)))
    }

    /// Configurations with exactly `size` closed switches.
    pub fn sized(&self, size: usize) -> ConfigSet<'a> {
        self.with_family(self.family.sized(size))
    }

    /// Configurations with fewer than `size` closed switches.
    pub fn smaller(&self, size: usize) -> ConfigSet<'a> {
        self.with_family(self.family.smaller(size))
    }

    /// Configurations with more than `size` closed switches.
    pub fn larger(&self, size: usize) -> ConfigSet<'a> {
        self.with_family(self.family.larger(size))
    }

    pub fn contains(&self, config: &Configuration) -> bool {
        config.len() == self.network.switches().len() && self.family.contains(config.as_bits())
    }

    pub fn iter(&self) -> impl Iterator<Item = Configuration> + '_ {
        self.family.iter().map(Configuration::from_bits)
    }

    /// Draws a configuration uniformly at random.
    pub fn choice<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Configuration> {
        self.family.sample(rng).map(Configuration::from_bits)
    }

    /// Iterates over the configurations in random order, each one once.
    pub fn rand_iter<R: Rng>(&self, rng: R) -> impl Iterator<Item = Configuration> {
        self.family.rand_iter(rng).map(Configuration::from_bits)
    }

    /// Per-switch weights in decision order. Switches without a weight count as 1.
    fn switch_weights(&self, weights: &BTreeMap<String, f64>) -> Result<Vec<f64>, DnetError> {
        let mut out = vec![1.0; self.network.switches().len()];
        for (name, &w) in weights {
            out[self.network.switch_index(name)?] = w;
        }
        Ok(out)
    }

    /// Iterates over the configurations in increasing order of the summed weights of their
    /// closed switches.
    pub fn min_iter(
        &self,
        weights: &BTreeMap<String, f64>,
    ) -> Result<impl Iterator<Item = (f64, Configuration)>, DnetError> {
        let weights = self.switch_weights(weights)?;
        Ok(self
            .family
            .min_iter(weights)
            .map(|(w, bits)| (w, Configuration::from_bits(bits))))
    }

    /// Iterates over the configurations in decreasing order of the summed weights of their
    /// closed switches.
    pub fn max_iter(
        &self,
        weights: &BTreeMap<String, f64>,
    ) -> Result<impl Iterator<Item = (f64, Configuration)>, DnetError> {
        let weights = self.switch_weights(weights)?;
        Ok(self
            .family
            .max_iter(weights)
            .map(|(w, bits)| (w, Configuration::from_bits(bits))))
    }

    /// Serialized decision diagram of the family.
    pub fn dumps(&self) -> String {
        self.family.dumps()
    }
}

impl PartialEq for ConfigSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.network.has_same_topology(other.network)
            && self.family.difference(&other.family).is_empty()
            && other.family.difference(&self.family).is_empty()
    }
}
