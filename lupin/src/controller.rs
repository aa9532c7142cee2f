//! The interaction state machine.
//!
//! State is (topic, table kind, tissue, sign) plus the page cursor.
//! Every transition builds the next state, re-ranks, and commits only
//! if ranking succeeded; a failed transition leaves the previous state
//! and page untouched. Callers that do more work after a transition
//! (e.g. fetching sparklines) take a [`Checkpoint`] first and restore
//! it when that work fails.

use crate::config::ViewerConfig;
use crate::cursor::PageCursor;
use crate::ranking::{rank_genes, RankQuery, Sign};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use topic_beans::{DataStore, Result, TableKind, ViewerError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub topic: Box<str>,
    pub table_kind: TableKind,
    /// `Some` iff `table_kind` is `IntraTissue`
    pub tissue: Option<Box<str>>,
    pub sign: Sign,
}

impl ViewState {
    /// First topic, first table kind of the loaded configuration,
    /// positive sign
    pub fn initial(store: &DataStore) -> Self {
        let table_kind = store.default_table_kind();
        Self {
            topic: store.default_topic().into(),
            table_kind,
            tissue: table_kind
                .requires_tissue()
                .then(|| store.default_tissue().into()),
            sign: Sign::Positive,
        }
    }

    pub fn query(&self) -> RankQuery {
        RankQuery {
            topic: self.topic.clone(),
            kind: self.table_kind,
            tissue: self.tissue.clone(),
            sign: self.sign,
        }
    }
}

/// Saved state and page of a controller
#[derive(Debug, Clone)]
pub struct Checkpoint {
    state: ViewState,
    cursor: PageCursor,
    failure: Option<ViewerError>,
}

pub struct SelectionController {
    store: Arc<DataStore>,
    config: ViewerConfig,
    state: ViewState,
    cursor: PageCursor,
    /// why the initial ranking could not be built; cleared by the
    /// first successful transition
    failure: Option<ViewerError>,
}

impl SelectionController {
    ///
    /// Start in the initial state. If its ranking fails (e.g. a missing
    /// value in the default topic), the controller still starts with an
    /// empty page and keeps the error in [`Self::failure`], so other
    /// topics stay reachable.
    ///
    pub fn new(store: Arc<DataStore>, config: ViewerConfig) -> Result<Self> {
        let state = ViewState::initial(&store);
        let (ranking, failure) = match rank_genes(&store, &state.query()) {
            Ok(ranking) => (ranking, None),
            Err(e) => {
                warn!("initial ranking of topic {} failed: {}", state.topic, e);
                (vec![], Some(e))
            }
        };
        let cursor = PageCursor::new(ranking, config.page_size)?;
        Ok(Self {
            store,
            config,
            state,
            cursor,
            failure,
        })
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn failure(&self) -> Option<&ViewerError> {
        self.failure.as_ref()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            cursor: self.cursor.clone(),
            failure: self.failure.clone(),
        }
    }

    pub fn restore(&mut self, saved: Checkpoint) {
        debug!("{:?} rolled back to {:?}", self.state, saved.state);
        self.state = saved.state;
        self.cursor = saved.cursor;
        self.failure = saved.failure;
    }

    fn commit(&mut self, next: ViewState) -> Result<()> {
        let ranking = rank_genes(&self.store, &next.query())?;
        debug!(
            "{:?} -> {:?}: {} genes ranked",
            self.state,
            next,
            ranking.len()
        );
        self.cursor = PageCursor::new(ranking, self.config.page_size)?;
        self.state = next;
        self.failure = None;
        Ok(())
    }

    /// Back to the initial state from wherever we are
    pub fn reset(&mut self) -> Result<()> {
        self.commit(ViewState::initial(&self.store))
    }

    /// Show `topic`; sign, table kind and tissue stay as they are
    pub fn select_topic(&mut self, topic: &str) -> Result<()> {
        let next = ViewState {
            topic: topic.into(),
            ..self.state.clone()
        };
        self.commit(next)
    }

    /// Switch statistic. Leaving `IntraTissue` forgets the tissue;
    /// entering it without a tissue picks the default one.
    pub fn select_table_kind(&mut self, kind: TableKind) -> Result<()> {
        let tissue = if kind.requires_tissue() {
            Some(
                self.state
                    .tissue
                    .clone()
                    .unwrap_or_else(|| self.store.default_tissue().into()),
            )
        } else {
            None
        };

        let next = ViewState {
            table_kind: kind,
            tissue,
            ..self.state.clone()
        };
        self.commit(next)
    }

    /// Only meaningful for intra-tissue rankings
    pub fn select_tissue(&mut self, tissue: &str) -> Result<()> {
        if !self.state.table_kind.requires_tissue() {
            return Err(ViewerError::contract(format!(
                "cannot select tissue `{}` while showing {} statistics",
                tissue, self.state.table_kind
            )));
        }

        let next = ViewState {
            tissue: Some(tissue.into()),
            ..self.state.clone()
        };
        self.commit(next)
    }

    pub fn select_sign(&mut self, sign: Sign) -> Result<()> {
        let next = ViewState {
            sign,
            ..self.state.clone()
        };
        self.commit(next)
    }

    pub fn page_forward(&mut self) {
        self.cursor.forward();
        debug!("page offset {}", self.cursor.offset());
    }

    pub fn page_backward(&mut self) {
        self.cursor.backward();
        debug!("page offset {}", self.cursor.offset());
    }
}
