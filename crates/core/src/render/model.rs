//! Render model: notification hub and session side channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::enrichment::{Document, NodeId};
use crate::files::ProtectedFile;
use crate::storage::ReadTokenSet;

/// Identifies one subscription on a [`RenderModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What was rendered, with the URLs it displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Single image.
    Image {
        /// Displayed image URL.
        image_link: String,
    },
    /// Image choice picker.
    ImagePicker {
        /// Image URL of each choice.
        choices: Vec<String>,
    },
    /// Signature pad.
    SignaturePad {
        /// Background image URL, if any.
        background_image: Option<String>,
    },
    /// File attachment question.
    File {
        /// Files on the currently displayed preview page.
        page_items: Vec<ProtectedFile>,
    },
    /// Free-form HTML content.
    Html,
    /// Anything without storage-backed images.
    Other(String),
}

/// Element-rendered notification.
#[derive(Debug, Clone)]
pub struct ElementRendered {
    /// Element name.
    pub name: String,
    /// Element kind and its URLs.
    pub kind: ElementKind,
    /// Root of the element's freshly rendered subtree.
    pub root: NodeId,
}

/// Header-rendered notification.
#[derive(Debug, Clone)]
pub struct HeaderRendered {
    /// Root of the rendered header.
    pub root: NodeId,
    /// Logo URL, if the form has one.
    pub logo: Option<String>,
}

/// Handler for element-rendered notifications.
pub type ElementRenderedHandler = Arc<dyn Fn(&mut Document, &ElementRendered) + Send + Sync>;

/// Handler for header-rendered notifications.
pub type HeaderRenderedHandler = Arc<dyn Fn(&mut Document, &HeaderRendered) + Send + Sync>;

/// Rendering session model.
///
/// The rendering engine calls [`RenderModel::emit_element_rendered`] and
/// [`RenderModel::emit_header_rendered`]; handlers run synchronously inside
/// that call, so an element is never observable without its tokens.
#[derive(Default)]
pub struct RenderModel {
    next_id: AtomicU64,
    element_handlers: Mutex<Vec<(SubscriptionId, ElementRenderedHandler)>>,
    header_handlers: Mutex<Vec<(SubscriptionId, HeaderRenderedHandler)>>,
    read_tokens: OnceLock<Arc<ReadTokenSet>>,
}

impl std::fmt::Debug for RenderModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderModel")
            .field("handlers", &self.handler_count())
            .field("read_tokens", &self.read_tokens.get().is_some())
            .finish_non_exhaustive()
    }
}

impl RenderModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_subscription(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to element-rendered notifications.
    pub fn on_element_rendered(&self, handler: ElementRenderedHandler) -> SubscriptionId {
        let id = self.next_subscription();
        self.element_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        id
    }

    /// Subscribe to header-rendered notifications.
    pub fn on_header_rendered(&self, handler: HeaderRenderedHandler) -> SubscriptionId {
        let id = self.next_subscription();
        self.header_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.element_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sub, _)| *sub != id);
        self.header_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sub, _)| *sub != id);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.element_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
            + self
                .header_handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
    }

    /// Notify subscribers that an element finished rendering.
    pub fn emit_element_rendered(&self, doc: &mut Document, event: &ElementRendered) {
        // Snapshot so handlers may unsubscribe while running.
        let handlers: Vec<ElementRenderedHandler> = self
            .element_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(doc, event);
        }
    }

    /// Notify subscribers that the header finished rendering.
    pub fn emit_header_rendered(&self, doc: &mut Document, event: &HeaderRendered) {
        let handlers: Vec<HeaderRenderedHandler> = self
            .header_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(doc, event);
        }
    }

    /// Attach session read tokens. Returns `false` if already attached.
    pub fn attach_read_tokens(&self, tokens: Arc<ReadTokenSet>) -> bool {
        self.read_tokens.set(tokens).is_ok()
    }

    /// Session read tokens, for nested or lazy render paths.
    #[must_use]
    pub fn read_tokens(&self) -> Option<&Arc<ReadTokenSet>> {
        self.read_tokens.get()
    }
}
