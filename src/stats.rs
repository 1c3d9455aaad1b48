//! Aggregate figures computed from the accepted energy costs.

use crate::config::AnalyzerConfig;

/// Sum of all accepted energy costs.
pub fn total_energy_cost(costs: &[i64]) -> i64 {
    costs.iter().fold(0i64, |total, &cost| total.saturating_add(cost))
}

/// Number of cards per energy cost, one bucket per cost in `min_cost..=max_cost`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnergyHistogram {
    min_cost: i64,
    counts: Vec<usize>,
}

impl EnergyHistogram {
    /// Buckets `costs` using the cost range from `config`.
    ///
    /// Costs outside the range are ignored.
    pub fn from_costs(costs: &[i64], config: &AnalyzerConfig) -> Self {
        let mut counts = vec![0; config.bucket_count()];
        for &cost in costs {
            if !config.cost_in_range(cost) {
                continue;
            }
            if let Some(slot) = usize::try_from(cost - config.min_cost)
                .ok()
                .and_then(|idx| counts.get_mut(idx))
            {
                *slot += 1;
            }
        }
        Self {
            min_cost: config.min_cost,
            counts,
        }
    }

    /// Raw bucket counts, lowest cost first.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Pairs of `(cost, count)` for every bucket, lowest cost first.
    pub fn buckets(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        let min_cost = self.min_cost;
        self.counts
            .iter()
            .enumerate()
            .map(move |(idx, &count)| (min_cost.saturating_add(idx as i64), count))
    }

    /// Largest bucket count.
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Summary figures shown in the report.
#[derive(Clone, Debug, PartialEq)]
pub struct DeckSummary {
    pub card_count: usize,
    pub total_cost: i64,
    pub histogram: EnergyHistogram,
}

impl DeckSummary {
    pub fn from_costs(costs: &[i64], config: &AnalyzerConfig) -> Self {
        Self {
            card_count: costs.len(),
            total_cost: total_energy_cost(costs),
            histogram: EnergyHistogram::from_costs(costs, config),
        }
    }

    /// Mean energy cost, or `None` for an empty deck.
    pub fn average_cost(&self) -> Option<f64> {
        if self.card_count == 0 {
            None
        } else {
            Some(self.total_cost as f64 / self.card_count as f64)
        }
    }
}
