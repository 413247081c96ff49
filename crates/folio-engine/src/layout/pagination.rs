use crate::editing::Document;
use crate::layout::{available_height, MeasureHeight};
use crate::notify::{ChangeSubscriber, NotifyPhase};

/// One printable page, derived from the current content height. Pages
/// are never mutated directly; the whole sequence is recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// Content height budget of this page.
    pub height_budget: u32,
}

/// Pages needed for the given content height.
pub fn page_count_for_height(content_height: u32) -> usize {
    (content_height.div_ceil(available_height()) as usize).max(1)
}

/// Derives the ordered page sequence from content height measurements.
///
/// A document always occupies at least one page, so the paginator
/// starts at one page and a missing measurement retains the previous
/// sequence unchanged — the count never regresses to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    pages: Vec<Page>,
}

impl Paginator {
    pub fn new() -> Self {
        Self {
            pages: build_pages(1),
        }
    }

    /// Recompute from a measurement, or keep the previous sequence
    /// when none is available. Returns the current page count.
    pub fn recompute(&mut self, measured_height: Option<u32>) -> usize {
        if let Some(height) = measured_height {
            let count = page_count_for_height(height);
            if count != self.pages.len() {
                self.pages = build_pages(count);
            }
        }
        self.pages.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

fn build_pages(count: usize) -> Vec<Page> {
    (1..=count)
        .map(|number| Page {
            number,
            height_budget: available_height(),
        })
        .collect()
}

/// Pagination engine: a paginator bound to the host's measurement
/// capability, recomputing after every committed mutation and on
/// viewport resize.
pub struct PaginationEngine {
    paginator: Paginator,
    measure: MeasureHeight,
}

impl PaginationEngine {
    pub fn new(measure: MeasureHeight) -> Self {
        Self {
            paginator: Paginator::new(),
            measure,
        }
    }

    pub fn recompute(&mut self) -> usize {
        self.paginator.recompute((self.measure)())
    }

    pub fn page_count(&self) -> usize {
        self.paginator.page_count()
    }

    pub fn pages(&self) -> &[Page] {
        self.paginator.pages()
    }
}

impl ChangeSubscriber for PaginationEngine {
    fn phase(&self) -> NotifyPhase {
        NotifyPhase::Layout
    }

    fn document_changed(&mut self, _doc: &Document) {
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    // ============ Page count formula tests ============

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(863, 1)]
    #[case(864, 1)]
    #[case(865, 2)]
    #[case(1728, 2)]
    #[case(3000, 4)]
    fn test_page_count_formula(#[case] height: u32, #[case] expected: usize) {
        assert_eq!(page_count_for_height(height), expected);
    }

    // ============ Paginator tests ============

    #[test]
    fn test_paginator_starts_at_one_page() {
        let paginator = Paginator::new();

        assert_eq!(paginator.page_count(), 1);
        assert_eq!(
            paginator.pages(),
            &[Page {
                number: 1,
                height_budget: 864
            }]
        );
    }

    #[test]
    fn test_recompute_builds_numbered_pages() {
        let mut paginator = Paginator::new();
        paginator.recompute(Some(3000));

        let numbers: Vec<usize> = paginator.pages().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(paginator.pages().iter().all(|p| p.height_budget == 864));
    }

    #[test]
    fn test_missing_measurement_retains_previous_pages() {
        let mut paginator = Paginator::new();
        paginator.recompute(Some(2000));
        assert_eq!(paginator.page_count(), 3);

        let count = paginator.recompute(None);

        assert_eq!(count, 3);
        assert_eq!(paginator.page_count(), 3);
    }

    #[test]
    fn test_shrinking_content_reduces_pages_but_never_below_one() {
        let mut paginator = Paginator::new();
        paginator.recompute(Some(5000));
        paginator.recompute(Some(0));

        assert_eq!(paginator.page_count(), 1);
    }

    // ============ Engine tests ============

    #[test]
    fn test_engine_reads_injected_measurement() {
        let height = Rc::new(Cell::new(None));
        let reader = height.clone();
        let mut engine = PaginationEngine::new(Box::new(move || reader.get()));

        // Surface not yet attached: previous count retained.
        assert_eq!(engine.recompute(), 1);

        height.set(Some(3000));
        assert_eq!(engine.recompute(), 4);

        // Measurement lost again: count holds steady.
        height.set(None);
        assert_eq!(engine.recompute(), 4);
    }
}
