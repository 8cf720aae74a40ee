//! In-memory row view, used by the binary and by tests

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::asset::{IconState, IconTarget, LayerType, StaticImage, TargetId};
use crate::template::{runs_to_string, StyledRun};

use super::bind::{Navigator, RowView};
use super::model::ClickAction;

/// A row held in memory; records whatever was bound to it
#[derive(Debug, Clone)]
pub struct RenderedRow {
    id: TargetId,
    datetime: Option<DateTime<Utc>>,
    header_runs: Vec<StyledRun>,
    header_action: Option<ClickAction>,
    body_runs: Vec<StyledRun>,
    body_opacity: f32,
    icon: IconState,
}

impl RenderedRow {
    pub fn new(id: TargetId, placeholder: StaticImage) -> Self {
        Self {
            id,
            datetime: None,
            header_runs: Vec::new(),
            header_action: None,
            body_runs: Vec::new(),
            body_opacity: 1.0,
            icon: IconState::Pending(placeholder),
        }
    }

    pub fn header_text(&self) -> String {
        runs_to_string(&self.header_runs)
    }

    pub fn header_runs(&self) -> &[StyledRun] {
        &self.header_runs
    }

    pub fn header_action(&self) -> Option<&ClickAction> {
        self.header_action.as_ref()
    }

    pub fn body_runs(&self) -> &[StyledRun] {
        &self.body_runs
    }

    pub fn body_opacity(&self) -> f32 {
        self.body_opacity
    }

    pub fn icon(&self) -> &IconState {
        &self.icon
    }

    /// Click the header. Returns false when the header has no action.
    pub fn click_header(&self, navigator: &dyn Navigator) -> bool {
        match &self.header_action {
            Some(action) => {
                action.dispatch(navigator);
                true
            }
            None => false,
        }
    }

    pub fn to_output(&self) -> RowOutput {
        RowOutput {
            id: self.id,
            datetime: self.datetime,
            header_text: self.header_text(),
            header_runs: self.header_runs.clone(),
            header_action: self.header_action.clone(),
            body_styled_runs: self.body_runs.clone(),
            body_opacity: self.body_opacity,
            icon_state: IconOutput::from(&self.icon),
        }
    }
}

impl IconTarget for RenderedRow {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn set_icon(&mut self, state: IconState) {
        self.icon = state;
    }
}

impl RowView for RenderedRow {
    fn set_datetime(&mut self, datetime: DateTime<Utc>) {
        self.datetime = Some(datetime);
    }

    fn set_header(&mut self, runs: Vec<StyledRun>, action: Option<ClickAction>) {
        self.header_runs = runs;
        self.header_action = action;
    }

    fn set_message(&mut self, runs: Vec<StyledRun>, opacity: f32) {
        self.body_runs = runs;
        self.body_opacity = opacity;
    }
}

/// Serializable snapshot of a row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowOutput {
    pub id: TargetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    pub header_text: String,
    pub header_runs: Vec<StyledRun>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_action: Option<ClickAction>,
    pub body_styled_runs: Vec<StyledRun>,
    pub body_opacity: f32,
    pub icon_state: IconOutput,
}

/// Icon state without pixel data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum IconOutput {
    Pending { image: StaticImage },
    Success { width: u32, height: u32, layer: LayerType },
    Fallback { image: StaticImage },
}

impl From<&IconState> for IconOutput {
    fn from(state: &IconState) -> Self {
        match state {
            IconState::Pending(image) => IconOutput::Pending {
                image: image.clone(),
            },
            IconState::Success(raster) => IconOutput::Success {
                width: raster.width,
                height: raster.height,
                layer: raster.layer,
            },
            IconState::Fallback(image) => IconOutput::Fallback {
                image: image.clone(),
            },
        }
    }
}
