//! Render model events and the view handler binder.

mod binder;
mod model;

pub use binder::{
    UnregisterHandle, bind_view, enrich_rendered_element, enrich_rendered_header,
    register_view_handlers,
};
pub use model::{
    ElementKind, ElementRendered, ElementRenderedHandler, HeaderRendered, HeaderRenderedHandler,
    RenderModel, SubscriptionId,
};
