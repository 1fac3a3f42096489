use memora_core::models::test_result::TestItem;

/// Sum of item scores. Scores that are not numeric count as zero.
pub fn recompute_total(items: &[TestItem]) -> f64 {
    items.iter().map(|item| item.score.as_f64()).sum()
}
