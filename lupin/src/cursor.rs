use crate::ranking::RankedGene;
use topic_beans::{Result, ViewerError};

/// A window of `page_size` rows over one ranking.
///
/// The offset is always a multiple of the page size and never moves
/// past the start of the last page. A new ranking means a new cursor;
/// offsets are not carried over.
#[derive(Debug, Clone)]
pub struct PageCursor {
    ranking: Vec<RankedGene>,
    page_size: usize,
    offset: usize,
}

impl PageCursor {
    pub fn new(ranking: Vec<RankedGene>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(ViewerError::contract("page size must be positive"));
        }
        Ok(Self {
            ranking,
            page_size,
            offset: 0,
        })
    }

    /// Start of the last (possibly partial) page; 0 for an empty ranking
    pub fn last_page_start(&self) -> usize {
        match self.ranking.len() {
            0 => 0,
            n => ((n - 1) / self.page_size) * self.page_size,
        }
    }

    pub fn forward(&mut self) {
        self.offset = (self.offset + self.page_size).min(self.last_page_start());
    }

    pub fn backward(&mut self) {
        self.offset = self.offset.saturating_sub(self.page_size);
    }

    pub fn current_page(&self) -> &[RankedGene] {
        let lb = self.offset.min(self.ranking.len());
        let ub = (self.offset + self.page_size).min(self.ranking.len());
        &self.ranking[lb..ub]
    }

    pub fn has_prev_page(&self) -> bool {
        self.offset > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.offset + self.page_size < self.ranking.len()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn ranking(&self) -> &[RankedGene] {
        &self.ranking
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(n: usize) -> Vec<RankedGene> {
        (0..n)
            .map(|i| RankedGene {
                gene: format!("g{:02}", i).into(),
                value: (n - i) as f32,
            })
            .collect()
    }

    #[test]
    fn pages_walk_forward_and_clamp() -> Result<()> {
        let mut cursor = PageCursor::new(ranking(23), 10)?;
        assert_eq!(cursor.current_page().len(), 10);
        assert!(!cursor.has_prev_page());
        assert!(cursor.has_next_page());

        cursor.forward();
        assert_eq!(cursor.offset(), 10);
        assert_eq!(cursor.current_page()[0].gene.as_ref(), "g10");
        assert!(cursor.has_prev_page());

        cursor.forward();
        assert_eq!(cursor.offset(), 20);
        assert_eq!(cursor.current_page().len(), 3);
        assert!(!cursor.has_next_page());

        cursor.forward();
        assert_eq!(cursor.offset(), 20);

        cursor.backward();
        cursor.backward();
        cursor.backward();
        assert_eq!(cursor.offset(), 0);
        Ok(())
    }

    #[test]
    fn forward_then_backward_is_identity_before_the_last_page() -> Result<()> {
        for n in [1, 9, 10, 11, 35] {
            for p in [1, 3, 10] {
                let mut cursor = PageCursor::new(ranking(n), p)?;
                while cursor.offset() < cursor.last_page_start() {
                    let before = (cursor.offset(), cursor.current_page().to_vec());
                    cursor.forward();
                    cursor.backward();
                    assert_eq!(before, (cursor.offset(), cursor.current_page().to_vec()));
                    cursor.forward();
                }
            }
        }
        Ok(())
    }

    #[test]
    fn exact_multiple_has_no_empty_last_page() -> Result<()> {
        let mut cursor = PageCursor::new(ranking(20), 10)?;
        cursor.forward();
        cursor.forward();
        assert_eq!(cursor.offset(), 10);
        assert_eq!(cursor.current_page().len(), 10);
        assert!(!cursor.has_next_page());
        Ok(())
    }

    #[test]
    fn empty_ranking_has_one_empty_page() -> Result<()> {
        let mut cursor = PageCursor::new(vec![], 5)?;
        cursor.forward();
        assert_eq!(cursor.offset(), 0);
        assert!(cursor.current_page().is_empty());
        assert!(!cursor.has_prev_page() && !cursor.has_next_page());
        Ok(())
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(PageCursor::new(ranking(3), 0).is_err());
    }
}
