use super::types::{AssetSnapshot, ProjectionInputs};

const PERIODS_PER_YEAR: u32 = 2;
const MONTHS_PER_PERIOD: f64 = 6.0;

#[derive(Debug, Default, Clone, Copy)]
struct Balances {
    savings: f64,
    investment: f64,
}

impl Balances {
    fn total(self) -> f64 {
        self.savings + self.investment
    }
}

#[derive(Debug, Clone, Copy)]
struct PeriodFlow {
    savings_contribution: f64,
    investment_contribution: f64,
    investment_growth: f64,
}

impl PeriodFlow {
    fn from_inputs(inputs: &ProjectionInputs) -> Self {
        let annual_rate = inputs.annual_return_rate as f64 / 100.0;
        Self {
            savings_contribution: inputs.monthly_savings as f64 * MONTHS_PER_PERIOD,
            investment_contribution: inputs.monthly_investment as f64 * MONTHS_PER_PERIOD,
            investment_growth: 1.0 + annual_rate / PERIODS_PER_YEAR as f64,
        }
    }
}

/// Projects savings and investment balances year by year, compounding the
/// investment balance twice a year at half the annual rate.
///
/// One snapshot is emitted per age in `current_age..=retirement_age`, taken
/// after both half-years of that age. Returns an empty vector when the
/// retirement age is below the current age.
pub fn project_semi_annual_assets(inputs: &ProjectionInputs) -> Vec<AssetSnapshot> {
    let flow = PeriodFlow::from_inputs(inputs);
    let mut balances = Balances::default();
    let mut snapshots = Vec::new();

    for age in inputs.current_age..=inputs.retirement_age {
        for _ in 0..PERIODS_PER_YEAR {
            apply_half_year(&mut balances, &flow);
        }
        snapshots.push(AssetSnapshot {
            age,
            savings: balances.savings,
            investment: balances.investment,
            total: balances.total(),
        });
    }
    snapshots
}

// Contributions land before the period's growth is applied.
fn apply_half_year(balances: &mut Balances, flow: &PeriodFlow) {
    balances.savings += flow.savings_contribution;
    balances.investment += flow.investment_contribution;
    balances.investment *= flow.investment_growth;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> ProjectionInputs {
        ProjectionInputs {
            current_age: 20,
            retirement_age: 65,
            monthly_savings: 1_000,
            monthly_investment: 1_000,
            annual_return_rate: 5,
        }
    }

    #[test]
    fn zero_return_two_years_accumulates_linearly() {
        let inputs = ProjectionInputs {
            current_age: 20,
            retirement_age: 21,
            annual_return_rate: 0,
            ..sample_inputs()
        };

        let snapshots = project_semi_annual_assets(&inputs);
        assert_eq!(
            snapshots,
            vec![
                AssetSnapshot {
                    age: 20,
                    savings: 12_000.0,
                    investment: 12_000.0,
                    total: 24_000.0,
                },
                AssetSnapshot {
                    age: 21,
                    savings: 24_000.0,
                    investment: 24_000.0,
                    total: 48_000.0,
                },
            ]
        );
    }

    #[test]
    fn retirement_before_current_age_is_empty() {
        let inputs = ProjectionInputs {
            current_age: 30,
            retirement_age: 29,
            ..sample_inputs()
        };
        assert!(project_semi_annual_assets(&inputs).is_empty());
    }

    #[test]
    fn single_year_contributes_then_compounds_each_half() {
        let inputs = ProjectionInputs {
            current_age: 20,
            retirement_age: 20,
            monthly_savings: 0,
            monthly_investment: 1_000,
            annual_return_rate: 10,
        };

        let snapshots = project_semi_annual_assets(&inputs);
        assert_eq!(snapshots.len(), 1);
        let year = snapshots[0];
        assert_eq!(year.age, 20);
        assert_eq!(year.savings, 0.0);
        assert_approx(year.investment, (6_000.0 * 1.05 + 6_000.0) * 1.05);
        assert_approx(year.investment, 12_915.0);
        assert_eq!(year.total, year.investment);

        // Growth-then-contribute would leave the second deposit unearned.
        let compound_first = (6_000.0 * 1.05) * 1.05 + 6_000.0;
        assert!(year.investment > compound_first);
    }

    #[test]
    fn return_rate_never_touches_savings() {
        let inputs = ProjectionInputs {
            current_age: 40,
            retirement_age: 44,
            monthly_savings: 250,
            monthly_investment: 0,
            annual_return_rate: 12,
        };

        for (k, year) in project_semi_annual_assets(&inputs).iter().enumerate() {
            assert_eq!(year.savings, 3_000.0 * (k + 1) as f64);
            assert_eq!(year.investment, 0.0);
        }
    }

    #[test]
    fn default_form_values_end_near_known_total() {
        let snapshots = project_semi_annual_assets(&sample_inputs());
        assert_eq!(snapshots.len(), 46);

        let last = snapshots.last().expect("non-empty projection");
        assert_eq!(last.age, 65);
        assert_eq!(last.savings, 552_000.0);

        let growth: f64 = 1.025;
        let mut expected_investment = 0.0;
        for _ in 0..92 {
            expected_investment = (expected_investment + 6_000.0) * growth;
        }
        assert_approx(last.investment, expected_investment);
        assert!(last.investment > 2.0 * last.savings);
    }

    #[test]
    fn each_call_starts_from_empty_balances() {
        let inputs = sample_inputs();
        let first = project_semi_annual_assets(&inputs);
        let second = project_semi_annual_assets(&inputs);
        assert_eq!(first, second);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_one_snapshot_per_age_in_order(
            current_age in 0u32..100,
            retirement_age in 0u32..120,
            monthly_savings in 0u32..50_000,
            monthly_investment in 0u32..50_000,
            annual_return_rate in 0u32..30
        ) {
            let inputs = ProjectionInputs {
                current_age,
                retirement_age,
                monthly_savings,
                monthly_investment,
                annual_return_rate,
            };
            let snapshots = project_semi_annual_assets(&inputs);

            let expected_len = if retirement_age >= current_age {
                (retirement_age - current_age + 1) as usize
            } else {
                0
            };
            prop_assert_eq!(snapshots.len(), expected_len);

            for (k, year) in snapshots.iter().enumerate() {
                prop_assert_eq!(year.age, current_age + k as u32);
                prop_assert_eq!(year.total, year.savings + year.investment);
                prop_assert!(year.investment.is_finite());
            }
            for pair in snapshots.windows(2) {
                prop_assert!(pair[1].savings >= pair[0].savings);
                prop_assert!(pair[1].investment >= pair[0].investment);
            }
        }

        #[test]
        fn prop_zero_return_matches_straight_line_sum(
            current_age in 18u32..70,
            span in 0u32..50,
            monthly_savings in 0u32..100_000,
            monthly_investment in 0u32..100_000
        ) {
            let inputs = ProjectionInputs {
                current_age,
                retirement_age: current_age + span,
                monthly_savings,
                monthly_investment,
                annual_return_rate: 0,
            };

            for (k, year) in project_semi_annual_assets(&inputs).iter().enumerate() {
                let years = (k + 1) as f64;
                prop_assert_eq!(year.savings, monthly_savings as f64 * 6.0 * 2.0 * years);
                prop_assert_eq!(year.investment, monthly_investment as f64 * 6.0 * 2.0 * years);
            }
        }

        #[test]
        fn prop_investment_stays_zero_without_contributions_or_return(
            current_age in 18u32..70,
            span in 0u32..50,
            monthly_savings in 0u32..100_000
        ) {
            let inputs = ProjectionInputs {
                current_age,
                retirement_age: current_age + span,
                monthly_savings,
                monthly_investment: 0,
                annual_return_rate: 0,
            };

            for year in project_semi_annual_assets(&inputs) {
                prop_assert_eq!(year.investment, 0.0);
                prop_assert_eq!(year.total, year.savings);
            }
        }

        #[test]
        fn prop_positive_return_beats_zero_return(
            current_age in 18u32..60,
            span in 0u32..40,
            monthly_investment in 1u32..10_000,
            annual_return_rate in 1u32..20
        ) {
            let with_return = ProjectionInputs {
                current_age,
                retirement_age: current_age + span,
                monthly_savings: 0,
                monthly_investment,
                annual_return_rate,
            };
            let flat = ProjectionInputs {
                annual_return_rate: 0,
                ..with_return
            };

            let grown = project_semi_annual_assets(&with_return);
            let straight = project_semi_annual_assets(&flat);
            for (g, s) in grown.iter().zip(&straight) {
                prop_assert!(g.investment > s.investment);
                prop_assert_eq!(g.savings, s.savings);
            }
        }
    }
}
