//! Turning notifications into display rows.
//!
//! `Renderer::build` produces a `RenderModel` value; `bind` applies it to any
//! `RowView` and starts the row's icon load.

mod bind;
mod model;
mod row;

pub use bind::{bind, NavigateEvent, Navigator, RowView};
pub use model::{ClickAction, IconRequest, RenderModel, Renderer};
pub use row::{IconOutput, RenderedRow, RowOutput};
