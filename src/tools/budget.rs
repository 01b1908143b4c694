use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

/// Parameters for splitting a trip budget
#[derive(Debug, Deserialize, JsonSchema)]
pub struct BudgetParams {
    /// Total trip budget in a single currency
    pub total_budget: f64,
    /// Number of days the budget has to cover
    pub days: u32,
    /// Number of travelers sharing the budget
    #[serde(default)]
    pub travelers: Option<u32>,
    /// Fraction of the budget reserved for lodging, between 0 and 1
    #[serde(default)]
    pub lodging_share: Option<f64>,
}

const DEFAULT_LODGING_SHARE: f64 = 0.4;

crate::tool!(
    name = "budget_calculator",
    description = "Split a total trip budget into per-day, per-person, lodging, and daily spending figures",
    params = BudgetParams,
    |params: BudgetParams| async move {
        if params.total_budget < 0.0 || !params.total_budget.is_finite() {
            return Err("total_budget must be a non-negative number".to_string());
        }
        if params.days == 0 {
            return Err("days must be at least 1".to_string());
        }
        let travelers = params.travelers.unwrap_or(1).max(1);
        let lodging_share = params.lodging_share.unwrap_or(DEFAULT_LODGING_SHARE);
        if !(0.0..=1.0).contains(&lodging_share) {
            return Err("lodging_share must be between 0 and 1".to_string());
        }

        let days = f64::from(params.days);
        let per_day = params.total_budget / days;
        let lodging_total = params.total_budget * lodging_share;

        Ok(json!({
            "total_budget": params.total_budget,
            "days": params.days,
            "travelers": travelers,
            "per_day": round2(per_day),
            "per_person": round2(params.total_budget / f64::from(travelers)),
            "per_person_per_day": round2(per_day / f64::from(travelers)),
            "lodging_total": round2(lodging_total),
            "lodging_per_night": round2(lodging_total / days),
            "daily_spending": round2((params.total_budget - lodging_total) / days)
        }))
    }
);

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;

    #[tokio::test]
    async fn test_budget_split() {
        let result = BudgetCalculator
            .execute(json!({"total_budget": 2000.0, "days": 7, "travelers": 2}))
            .await
            .unwrap();

        assert_eq!(result["per_day"], 285.71);
        assert_eq!(result["per_person"], 1000.0);
        assert_eq!(result["lodging_total"], 800.0);
        assert_eq!(result["daily_spending"], 171.43);
    }

    #[tokio::test]
    async fn test_zero_days_is_rejected() {
        let err = BudgetCalculator
            .execute(json!({"total_budget": 500.0, "days": 0}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("days must be at least 1"));
    }

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = BudgetCalculator.parameters_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("total_budget")));
        assert!(required.contains(&json!("days")));
        assert!(!required.contains(&json!("travelers")));
    }
}
