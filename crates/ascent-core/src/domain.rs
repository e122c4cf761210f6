//! The seven tracked life domains.
//!
//! Routing is a closed enum with exhaustive matches: adding a domain is a
//! compile error everywhere it is not handled, and parsing an unknown name is
//! a hard [`CoreError::UnknownDomain`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Training = 0,
    Diet,
    Finance,
    Academics,
    Spiritual,
    Mental,
    Content,
}

impl Domain {
    /// Every domain, in discriminant order.
    pub const ALL: [Domain; 7] = [
        Domain::Training,
        Domain::Diet,
        Domain::Finance,
        Domain::Academics,
        Domain::Spiritual,
        Domain::Mental,
        Domain::Content,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Training => "training",
            Domain::Diet => "diet",
            Domain::Finance => "finance",
            Domain::Academics => "academics",
            Domain::Spiritual => "spiritual",
            Domain::Mental => "mental",
            Domain::Content => "content",
        }
    }

    /// Submission quality used for the xp grant.
    pub fn quality(self) -> u32 {
        match self {
            Domain::Training => 90,
            Domain::Diet => 85,
            Domain::Finance => 80,
            Domain::Academics => 75,
            Domain::Spiritual => 70,
            Domain::Mental => 70,
            Domain::Content => 65,
        }
    }

    /// XP granted for an accepted execution in this domain.
    pub fn xp_grant(self) -> u64 {
        u64::from((self.quality() + 1) / 2).max(5)
    }

    /// Domains that stay open while strict mode is active.
    pub fn is_essential(self) -> bool {
        !matches!(self, Domain::Content)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownDomain(s.to_string()))
    }
}

/// Aggregation weight for each domain. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainWeights {
    pub training: f64,
    pub diet: f64,
    pub finance: f64,
    pub academics: f64,
    pub spiritual: f64,
    pub mental: f64,
    pub content: f64,
}

impl Default for DomainWeights {
    fn default() -> Self {
        Self {
            training: 0.20,
            diet: 0.20,
            finance: 0.15,
            academics: 0.15,
            spiritual: 0.10,
            mental: 0.10,
            content: 0.10,
        }
    }
}

impl DomainWeights {
    pub fn get(&self, domain: Domain) -> f64 {
        match domain {
            Domain::Training => self.training,
            Domain::Diet => self.diet,
            Domain::Finance => self.finance,
            Domain::Academics => self.academics,
            Domain::Spiritual => self.spiritual,
            Domain::Mental => self.mental,
            Domain::Content => self.content,
        }
    }

    pub fn sum(&self) -> f64 {
        Domain::ALL.iter().map(|d| self.get(*d)).sum()
    }

    /// Validate that all weights are in [0.0, 1.0] and sum to 1.0.
    pub fn validate(&self) -> Result<(), String> {
        for domain in Domain::ALL {
            let weight = self.get(domain);
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("weight for {domain} must be in [0, 1], got {weight}"));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("weights must sum to 1.0, got {sum}"));
        }
        Ok(())
    }
}

/// One score per domain, indexed by [`Domain`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DomainScores([f64; 7]);

impl DomainScores {
    fn index(domain: Domain) -> usize {
        domain as usize
    }

    pub fn get(&self, domain: Domain) -> f64 {
        self.0[Self::index(domain)]
    }

    pub fn set(&mut self, domain: Domain, score: f64) {
        self.0[Self::index(domain)] = score;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, f64)> + '_ {
        Domain::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    /// Lowest-scoring domain among those accepted by `filter`.
    pub fn weakest(&self, filter: impl Fn(Domain) -> bool) -> Option<(Domain, f64)> {
        self.iter()
            .filter(|(d, _)| filter(*d))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn to_map(&self) -> BTreeMap<Domain, f64> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Training".parse::<Domain>().unwrap(), Domain::Training);
        assert_eq!(" diet ".parse::<Domain>().unwrap(), Domain::Diet);
    }

    #[test]
    fn unknown_domain_is_hard_error() {
        let err = "internet".parse::<Domain>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownDomain(ref name) if name == "internet"));
    }

    #[test]
    fn default_weights_sum_to_one() {
        let weights = DomainWeights::default();
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn skewed_weights_rejected() {
        let weights = DomainWeights {
            training: 0.5,
            ..DomainWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn xp_grant_follows_quality() {
        assert_eq!(Domain::Training.xp_grant(), 45);
        assert_eq!(Domain::Diet.xp_grant(), 43);
        assert_eq!(Domain::Content.xp_grant(), 33);
    }

    #[test]
    fn each_domain_has_its_own_slot() {
        let mut scores = DomainScores::default();
        for (i, d) in Domain::ALL.into_iter().enumerate() {
            assert_eq!(d as usize, i);
            scores.set(d, i as f64);
        }
        for (i, (d, score)) in scores.iter().enumerate() {
            assert_eq!(d, Domain::ALL[i]);
            assert_eq!(score, i as f64);
        }
    }

    #[test]
    fn weakest_respects_filter() {
        let mut scores = DomainScores::default();
        for d in Domain::ALL {
            scores.set(d, 80.0);
        }
        scores.set(Domain::Content, 10.0);
        scores.set(Domain::Finance, 30.0);
        assert_eq!(scores.weakest(|_| true), Some((Domain::Content, 10.0)));
        assert_eq!(
            scores.weakest(Domain::is_essential),
            Some((Domain::Finance, 30.0))
        );
    }
}
