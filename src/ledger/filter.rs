//! Selecting the transactions of one period for listing.

use crate::model::{Category, Transaction, TransactionType};
use crate::summary::Period;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// The number of transactions on one page of a listing.
pub const PAGE_SIZE: usize = 10;

/// Narrows a transaction listing. The default filter keeps everything.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Only keep transactions of this type.
    pub r#type: Option<TransactionType>,
    /// Only keep transactions where the description, the category name, the vendor or the check
    /// number contains this text, ignoring case.
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn new(r#type: Option<TransactionType>, search: Option<impl Into<String>>) -> Self {
        Self {
            r#type,
            search: search.map(Into::into).filter(|s| !s.trim().is_empty()),
        }
    }

    fn matches(&self, t: &Transaction, category_name: &str) -> bool {
        if let Some(r#type) = self.r#type {
            if t.r#type != r#type {
                return false;
            }
        }
        let needle = match &self.search {
            Some(search) => search.trim().to_lowercase(),
            None => return true,
        };
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        contains(&t.description)
            || contains(category_name)
            || t.vendor.as_deref().is_some_and(contains)
            || t.check_number.as_deref().is_some_and(contains)
    }
}

/// Returns the transactions dated within `period` that pass `filter`, newest first.
/// `categories` is used to match the search text against category names.
pub fn transactions_in_period<'a>(
    transactions: &'a [Transaction],
    categories: &[Category],
    period: Period,
    filter: &TransactionFilter,
) -> Vec<&'a Transaction> {
    let mut found = matching_transactions(transactions, categories, filter);
    found.retain(|t| period.contains(t.date));
    found
}

/// Returns every transaction that passes `filter`, whatever its date, newest first.
pub fn matching_transactions<'a>(
    transactions: &'a [Transaction],
    categories: &[Category],
    filter: &TransactionFilter,
) -> Vec<&'a Transaction> {
    let mut found: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| filter.matches(t, category_name(categories, &t.category_id)))
        .collect();
    found.sort_by_key(|t| Reverse(t.date));
    found
}

/// The name of category `id`, or "Unknown" when there is no such category.
pub fn category_name<'a>(categories: &'a [Category], id: &str) -> &'a str {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.as_str())
        .unwrap_or("Unknown")
}

/// One page of a longer listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Cuts `items` into pages of `PAGE_SIZE` and returns page `number` (1-based). Page numbers past
/// the end are clamped to the last page.
pub fn paginate<T>(items: Vec<T>, number: usize) -> Page<T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(PAGE_SIZE).max(1);
    let number = number.clamp(1, total_pages);
    let items = items
        .into_iter()
        .skip((number - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();
    Page {
        items,
        number,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, NewCategory, NewTransaction};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new("1", NewCategory::new("Cuotas", TransactionType::Income)),
            Category::new("4", NewCategory::new("Materiales", TransactionType::Expense)),
        ]
    }

    fn transactions() -> Vec<Transaction> {
        vec![
            Transaction::new(
                "a",
                NewTransaction::new(
                    TransactionType::Income,
                    AccountId::Cash,
                    "1",
                    15000.0,
                    date("2024-03-01"),
                    "Cuotas de marzo",
                ),
            ),
            Transaction::new(
                "b",
                NewTransaction::new(
                    TransactionType::Expense,
                    AccountId::Cash,
                    "4",
                    8500.0,
                    date("2024-03-31"),
                    "Compra de útiles",
                )
                .with_vendor("Librería El Ateneo")
                .with_check_number("00012345"),
            ),
            Transaction::new(
                "c",
                NewTransaction::new(
                    TransactionType::Expense,
                    AccountId::BancoProvincia,
                    "9",
                    100.0,
                    date("2024-04-01"),
                    "Comisión bancaria",
                ),
            ),
        ]
    }

    fn ids(found: &[&Transaction]) -> Vec<String> {
        found.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_period_bounds_and_order() {
        let transactions = transactions();
        let found = transactions_in_period(
            &transactions,
            &categories(),
            Period::new(2, 2024),
            &TransactionFilter::default(),
        );
        assert_eq!(ids(&found), vec!["b", "a"]);
    }

    #[test]
    fn test_matching_ignores_period() {
        let transactions = transactions();
        let filter = TransactionFilter::new(Some(TransactionType::Expense), None::<String>);
        let found = matching_transactions(&transactions, &categories(), &filter);
        assert_eq!(ids(&found), vec!["c", "b"]);
    }

    #[test]
    fn test_type_filter() {
        let transactions = transactions();
        let filter = TransactionFilter::new(Some(TransactionType::Income), None::<String>);
        let found =
            transactions_in_period(&transactions, &categories(), Period::new(2, 2024), &filter);
        assert_eq!(ids(&found), vec!["a"]);
    }

    #[test]
    fn test_search_fields() {
        let transactions = transactions();
        let categories = categories();
        let search = |text: &str| {
            let filter = TransactionFilter::new(None, Some(text));
            ids(&transactions_in_period(
                &transactions,
                &categories,
                Period::new(2, 2024),
                &filter,
            ))
        };
        assert_eq!(search("ÚTILES"), vec!["b"]);
        assert_eq!(search("materiales"), vec!["b"]);
        assert_eq!(search("ateneo"), vec!["b"]);
        assert_eq!(search("0001"), vec!["b"]);
        assert_eq!(search("cuotas"), vec!["a"]);
        assert!(search("comisión").is_empty());
        // Blank search keeps everything.
        assert_eq!(search("  "), vec!["b", "a"]);
    }

    #[test]
    fn test_category_name_fallback() {
        let categories = categories();
        assert_eq!(category_name(&categories, "4"), "Materiales");
        assert_eq!(category_name(&categories, "9"), "Unknown");
    }

    #[test]
    fn test_paginate() {
        let items: Vec<usize> = (0..25).collect();
        let page = paginate(items.clone(), 3);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);

        assert_eq!(paginate(items.clone(), 0).number, 1);
        assert_eq!(paginate(items, 99).number, 3);

        let empty = paginate(Vec::<usize>::new(), 1);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.items.is_empty());
    }
}
