use serde_json::Value;

/// Totals shown above the garage transaction table
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GarageSummary {
    pub transactions: usize,
    /// Sum of each transaction's `total`
    pub revenue: f64,
}

impl GarageSummary {
    /// Records without a readable `total` count as a transaction but add nothing to revenue
    pub fn from_transactions(transactions: &[Value]) -> Self {
        Self {
            transactions: transactions.len(),
            revenue: transactions.iter().filter_map(total_of).sum(),
        }
    }
}

/// `total` may arrive as a number or as a numeric string from older records
fn total_of(transaction: &Value) -> Option<f64> {
    match transaction.get("total")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
