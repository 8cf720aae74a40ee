//! Applying render models to row views

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::asset::{AssetPipeline, IconState, IconTarget, LoadHandle};
use crate::template::StyledRun;

use super::model::{ClickAction, RenderModel};

/// Request to open a URI outside the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateEvent {
    pub uri: String,
}

/// Receives navigation requests triggered by row clicks
pub trait Navigator {
    fn navigate(&self, event: NavigateEvent);
}

impl Navigator for mpsc::UnboundedSender<NavigateEvent> {
    fn navigate(&self, event: NavigateEvent) {
        if let Err(e) = self.send(event) {
            tracing::debug!(uri = %e.0.uri, "Navigation receiver dropped");
        }
    }
}

impl ClickAction {
    /// Perform the action: emits exactly one navigation event
    pub fn dispatch(&self, navigator: &dyn Navigator) {
        match self {
            ClickAction::OpenLink(uri) => navigator.navigate(NavigateEvent { uri: uri.clone() }),
        }
    }
}

/// A list row able to display a notification
pub trait RowView: IconTarget {
    fn set_datetime(&mut self, datetime: DateTime<Utc>);

    fn set_header(&mut self, runs: Vec<StyledRun>, action: Option<ClickAction>);

    fn set_message(&mut self, runs: Vec<StyledRun>, opacity: f32);
}

/// Populate `view` from `model` and start its icon load.
///
/// Rows without an icon never reach the network: any load still running for
/// the row (from a previous binding) is cancelled and the placeholder stays.
pub fn bind<V: RowView>(
    model: &RenderModel,
    view: &mut V,
    pipeline: &AssetPipeline,
) -> Option<LoadHandle> {
    view.set_datetime(model.datetime);
    view.set_header(model.header_runs.clone(), model.header_action.clone());
    view.set_message(model.body_styled_runs.clone(), model.body_opacity);

    match &model.icon_request {
        Some(request) => Some(pipeline.load(&request.uri, view)),
        None => {
            pipeline.cancel(view.target_id());
            view.set_icon(IconState::Pending(pipeline.config().placeholder_image.clone()));
            None
        }
    }
}
