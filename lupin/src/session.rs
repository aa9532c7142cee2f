//! Event entry points of one viewer session.
//!
//! Each `on_*` call is one transition of the selection state machine
//! followed by composing the render payload. The transition counts only
//! if the payload can be built; otherwise state and page roll back.
//! Sessions own their state; only the data store is shared between them.

use crate::config::ViewerConfig;
use crate::controller::{SelectionController, ViewState};
use crate::payload::{PageRow, RenderPayload};
use crate::ranking::Sign;
use crate::sparkline::SparklineProvider;
use std::sync::Arc;
use topic_beans::{DataStore, Result, TableKind};

/// User interactions the rendering layer forwards
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    TopicClick(Box<str>),
    TableKindChange(TableKind),
    TissueChange(Box<str>),
    SignChange(Sign),
    PageForward,
    PageBackward,
    Reset,
}

pub struct TopicViewer {
    controller: SelectionController,
    sparklines: SparklineProvider,
}

impl TopicViewer {
    pub fn new(store: Arc<DataStore>, config: ViewerConfig) -> Result<Self> {
        let sparklines = SparklineProvider::new(store.clone());
        let controller = SelectionController::new(store, config)?;
        Ok(Self {
            controller,
            sparklines,
        })
    }

    pub fn state(&self) -> &ViewState {
        self.controller.state()
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    /// Apply `step`, then render; undo `step` if either fails
    fn transition<F>(&mut self, step: F) -> Result<RenderPayload>
    where
        F: FnOnce(&mut SelectionController) -> Result<()>,
    {
        let saved = self.controller.checkpoint();
        step(&mut self.controller)?;
        match self.render() {
            Ok(payload) => Ok(payload),
            Err(e) => {
                self.controller.restore(saved);
                Err(e)
            }
        }
    }

    pub fn on_topic_click(&mut self, topic: &str) -> Result<RenderPayload> {
        self.transition(|c| c.select_topic(topic))
    }

    pub fn on_table_kind_change(&mut self, kind: TableKind) -> Result<RenderPayload> {
        self.transition(|c| c.select_table_kind(kind))
    }

    pub fn on_tissue_change(&mut self, tissue: &str) -> Result<RenderPayload> {
        self.transition(|c| c.select_tissue(tissue))
    }

    pub fn on_sign_change(&mut self, sign: Sign) -> Result<RenderPayload> {
        self.transition(|c| c.select_sign(sign))
    }

    pub fn on_page_forward(&mut self) -> Result<RenderPayload> {
        self.transition(|c| {
            c.page_forward();
            Ok(())
        })
    }

    pub fn on_page_backward(&mut self) -> Result<RenderPayload> {
        self.transition(|c| {
            c.page_backward();
            Ok(())
        })
    }

    pub fn on_reset(&mut self) -> Result<RenderPayload> {
        self.transition(|c| c.reset())
    }

    pub fn handle(&mut self, event: &ViewerEvent) -> Result<RenderPayload> {
        match event {
            ViewerEvent::TopicClick(topic) => self.on_topic_click(topic),
            ViewerEvent::TableKindChange(kind) => self.on_table_kind_change(*kind),
            ViewerEvent::TissueChange(tissue) => self.on_tissue_change(tissue),
            ViewerEvent::SignChange(sign) => self.on_sign_change(*sign),
            ViewerEvent::PageForward => self.on_page_forward(),
            ViewerEvent::PageBackward => self.on_page_backward(),
            ViewerEvent::Reset => self.on_reset(),
        }
    }

    /// Payload of the current state and page
    pub fn render(&self) -> Result<RenderPayload> {
        if let Some(e) = self.controller.failure() {
            return Err(e.clone());
        }

        let state = self.controller.state();
        let cursor = self.controller.cursor();
        let page = cursor.current_page();

        let lines = self
            .sparklines
            .sparklines(page, state.table_kind, state.tissue.as_deref())?;

        let page_rows = page
            .iter()
            .zip(lines)
            .enumerate()
            .map(|(i, (row, sparkline))| PageRow {
                rank: cursor.offset() + i,
                gene_id: row.gene.clone(),
                statistic_value: row.value,
                sparkline,
            })
            .collect();

        Ok(RenderPayload {
            topic_id: state.topic.clone(),
            table_kind: state.table_kind,
            tissue_id: state.tissue.clone(),
            sign: state.sign,
            page_rows,
            has_prev_page: cursor.has_prev_page(),
            has_next_page: cursor.has_next_page(),
            offset: cursor.offset(),
            total: cursor.len(),
        })
    }
}
