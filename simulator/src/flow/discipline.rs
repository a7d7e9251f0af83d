//! Rate allocation disciplines.

use flowsim_core::EPSILON;

/// Max-min fair allocation of `capacity` over `demands`.
///
/// Progressive filling in ascending demand order: each consumer takes
/// `min(demand, remaining / consumers_left)`. A consumer whose demand is
/// below the fair share is fully satisfied, and the freed share raises
/// the fair share of everyone after it. Zero demands are excluded from
/// the division and allocated zero.
pub(crate) fn max_min_fair(capacity: f64, demands: &[f64]) -> Vec<f64> {
    let mut allocations = vec![0.0; demands.len()];

    let mut order: Vec<usize> = (0..demands.len())
        .filter(|&i| demands[i] > EPSILON)
        .collect();
    order.sort_by(|&a, &b| demands[a].total_cmp(&demands[b]).then(a.cmp(&b)));

    let mut remaining = capacity.max(0.0);
    let mut left = order.len();
    for &i in &order {
        let fair_share = remaining / left as f64;
        let allocation = demands[i].min(fair_share);
        allocations[i] = allocation;
        remaining -= allocation;
        left -= 1;
    }
    allocations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_demand_is_satisfied_first() {
        let allocations = max_min_fair(1_000.0, &[700.0, 500.0]);
        assert_eq!(allocations, vec![500.0, 500.0]);
    }

    #[test]
    fn overprovisioned_pool_satisfies_everyone() {
        let allocations = max_min_fair(2_000.0, &[700.0, 500.0]);
        assert_eq!(allocations, vec![700.0, 500.0]);
    }

    #[test]
    fn equal_demands_split_evenly() {
        let allocations = max_min_fair(900.0, &[400.0, 400.0, 400.0]);
        assert_eq!(allocations, vec![300.0, 300.0, 300.0]);
    }

    #[test]
    fn freed_share_cascades() {
        // 100 is satisfied below the initial fair share of 1000/3;
        // the remainder splits between the two big consumers
        let allocations = max_min_fair(1_000.0, &[600.0, 100.0, 600.0]);
        assert_eq!(allocations, vec![450.0, 100.0, 450.0]);
    }

    #[test]
    fn zero_demand_is_excluded() {
        let allocations = max_min_fair(1_000.0, &[0.0, 800.0]);
        assert_eq!(allocations, vec![0.0, 800.0]);
    }

    #[test]
    fn no_consumers_leaves_capacity_unused() {
        assert!(max_min_fair(1_000.0, &[]).is_empty());
        assert_eq!(max_min_fair(1_000.0, &[0.0]), vec![0.0]);
    }

    #[test]
    fn allocations_never_exceed_capacity_or_demand() {
        let demands = [312.5, 17.0, 940.0, 123.0, 555.5];
        let allocations = max_min_fair(800.0, &demands);
        let total: f64 = allocations.iter().sum();
        assert!(total <= 800.0 + 1e-6);
        for (allocation, demand) in allocations.iter().zip(demands.iter()) {
            assert!(allocation <= demand);
        }
    }
}
