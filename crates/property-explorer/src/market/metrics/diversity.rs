use super::{require, MetricUndefined};
use crate::market::dataset::{Availability, CommunityRecord, TableKind};
use serde::Serialize;

const NEGLIGIBLE_SHARE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityShare {
    pub community: String,
    pub population: f64,
    pub share: f64,
}

/// Normalized Shannon entropy over the listed shares plus the residual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiversityIndex {
    /// In `[0, 1]`; 0 when only one category is non-zero.
    pub index: f64,
    pub other_share: f64,
    /// Non-zero categories, residual included.
    pub categories: usize,
    /// Shares summed above 1 and were rescaled.
    pub clamped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversityMetrics {
    /// Largest share first, ties alphabetical.
    pub communities: Vec<CommunityShare>,
    pub diversity: DiversityIndex,
}

pub fn analyse(
    communities: Availability<'_, &Vec<CommunityRecord>>,
    population: Option<f64>,
) -> Result<DiversityMetrics, MetricUndefined> {
    let records = require(communities, TableKind::Communities)?;
    let total_population = population.filter(|population| population.is_finite() && *population > 0.0);

    let mut shares = Vec::with_capacity(records.len());
    for record in records {
        let share = match (record.share, total_population) {
            (Some(share), _) => share,
            (None, Some(total)) => record.population / total,
            (None, None) => return Err(MetricUndefined::MissingPopulation),
        };
        shares.push(CommunityShare {
            community: record.community.clone(),
            population: record.population,
            share: if share.is_finite() { share.max(0.0) } else { 0.0 },
        });
    }
    shares.sort_by(|a, b| {
        b.share
            .total_cmp(&a.share)
            .then_with(|| a.community.cmp(&b.community))
    });

    let diversity = diversity_index(shares.iter().map(|share| share.share));
    if diversity.clamped {
        let sum: f64 = shares.iter().map(|share| share.share).sum();
        for share in &mut shares {
            share.share /= sum;
        }
    }
    Ok(DiversityMetrics {
        communities: shares,
        diversity,
    })
}

/// Entropy is summed over sorted shares so the result does not depend on the
/// order communities are listed in.
pub fn diversity_index(shares: impl IntoIterator<Item = f64>) -> DiversityIndex {
    let mut shares: Vec<f64> = shares
        .into_iter()
        .filter(|share| share.is_finite() && *share > NEGLIGIBLE_SHARE)
        .collect();
    shares.sort_by(f64::total_cmp);

    let sum: f64 = shares.iter().sum();
    let clamped = sum > 1.0 + 1e-9;
    let other_share = if clamped {
        for share in &mut shares {
            *share /= sum;
        }
        0.0
    } else {
        (1.0 - sum).max(0.0)
    };

    if other_share > NEGLIGIBLE_SHARE {
        shares.push(other_share);
        shares.sort_by(f64::total_cmp);
    }

    let categories = shares.len();
    let index = if categories <= 1 {
        0.0
    } else {
        let entropy: f64 = shares.iter().map(|share| -share * share.ln()).sum();
        (entropy / (categories as f64).ln()).clamp(0.0, 1.0)
    };

    DiversityIndex {
        index,
        other_share,
        categories,
        clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_does_not_change_index() {
        let a = diversity_index([0.31, 0.07, 0.12, 0.05, 0.2]);
        let b = diversity_index([0.05, 0.2, 0.31, 0.12, 0.07]);
        assert_eq!(a, b);
        assert_eq!(a.categories, 6);
    }

    #[test]
    fn single_category_has_zero_index() {
        let index = diversity_index([1.0]);
        assert_eq!(index.index, 0.0);
        assert_eq!(index.categories, 1);

        let empty = diversity_index(std::iter::empty());
        assert_eq!(empty.index, 0.0);
        assert_eq!(empty.other_share, 1.0);
    }

    #[test]
    fn even_split_is_maximally_diverse() {
        let index = diversity_index([0.25, 0.25, 0.25, 0.25]);
        assert!((index.index - 1.0).abs() < 1e-12);
        assert!(!index.clamped);
    }

    #[test]
    fn oversubscribed_shares_are_rescaled() {
        let index = diversity_index([0.8, 0.6]);
        assert!(index.clamped);
        assert_eq!(index.other_share, 0.0);
        assert_eq!(index.categories, 2);
        assert!(index.index > 0.0 && index.index <= 1.0);
    }

    #[test]
    fn displayed_shares_follow_the_rescaling() {
        let records: Vec<CommunityRecord> = [("Chinese", 0.9), ("Indian", 0.3)]
            .into_iter()
            .map(|(community, share)| CommunityRecord {
                community: community.to_string(),
                population: 0.0,
                share: Some(share),
            })
            .collect();
        let metrics = analyse(Availability::Available(&records), None).expect("culture");
        assert!(metrics.diversity.clamped);
        let total: f64 = metrics.communities.iter().map(|share| share.share).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((metrics.communities[0].share - 0.75).abs() < 1e-12);
    }

    #[test]
    fn shares_fall_back_to_population_ratio() {
        let records = vec![
            CommunityRecord {
                community: "Greek".to_string(),
                population: 100.0,
                share: None,
            },
            CommunityRecord {
                community: "Italian".to_string(),
                population: 300.0,
                share: None,
            },
        ];
        let metrics =
            analyse(Availability::Available(&records), Some(1_000.0)).expect("diversity");
        assert_eq!(metrics.communities[0].community, "Italian");
        assert!((metrics.diversity.other_share - 0.6).abs() < 1e-9);

        let error = analyse(Availability::Available(&records), None).expect_err("no population");
        assert_eq!(error, MetricUndefined::MissingPopulation);
    }
}
