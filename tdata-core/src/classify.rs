//! Rule-based taxonomy classification of extracted elements.
//!
//! Classification is total and stateless: each element is matched against
//! [`taxonomy::RULES`](crate::taxonomy::RULES), lands in at most one bucket, and keeps its
//! original casing. Elements matching no rule do not appear in the [`Summary`].

use std::borrow::Borrow;

use tracing::{debug, info};

use crate::contract::Element;
use crate::summary::Summary;
use crate::taxonomy::first_match;

/// Result of a classification pass including the elements no rule matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub summary: Summary,
    /// Texts of non-empty elements that matched no rule, in document order.
    pub unclassified: Vec<String>,
}

/// Bucket every element into the taxonomy (first matching rule wins).
pub fn classify<I>(elements: I) -> Summary
where
    I: IntoIterator,
    I::Item: Borrow<Element>,
{
    classify_with_overflow(elements).summary
}

/// Like [`classify`], but also returns what would otherwise be dropped.
pub fn classify_with_overflow<I>(elements: I) -> Classification
where
    I: IntoIterator,
    I::Item: Borrow<Element>,
{
    let mut result = Classification::default();
    let mut seen = 0usize;

    for element in elements {
        let element = element.borrow();
        seen += 1;
        match first_match(&element.text) {
            Some(category) => {
                debug!(
                    %category,
                    hint = %element.category_hint,
                    page = ?element.page_number(),
                    "[CLASSIFY] Element matched"
                );
                result.summary.record(category, element.text.clone());
            }
            None if element.text.trim().is_empty() => {}
            None => result.unclassified.push(element.text.clone()),
        }
    }

    info!(
        elements = seen,
        matched = result.summary.matched_count(),
        unclassified = result.unclassified.len(),
        "[CLASSIFY] Classification complete"
    );
    result
}
