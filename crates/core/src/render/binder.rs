//! Binds URL enrichment to render notifications.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::model::{ElementKind, ElementRendered, HeaderRendered, RenderModel, SubscriptionId};
use crate::enrichment::{Document, enrich_image_by_src, enrich_images_in_container};
use crate::storage::{ReadTokenProvider, StorageUrlResolver};

/// Removes the view handlers a binder registered.
///
/// Cloneable and idempotent: calling [`UnregisterHandle::unregister`] more
/// than once, or on a handle that never registered anything, is harmless.
#[derive(Debug, Clone)]
pub struct UnregisterHandle {
    model: Option<Arc<RenderModel>>,
    subscriptions: Arc<Mutex<Vec<SubscriptionId>>>,
}

impl UnregisterHandle {
    /// Handle that removes nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            model: None,
            subscriptions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Remove every subscription this handle owns.
    pub fn unregister(&self) {
        let Some(model) = &self.model else {
            return;
        };
        let ids: Vec<SubscriptionId> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for id in ids {
            model.unsubscribe(id);
        }
    }
}

/// Enrich the storage images of one rendered element.
///
/// Returns the number of mutated images.
pub fn enrich_rendered_element(
    doc: &mut Document,
    event: &ElementRendered,
    resolver: &StorageUrlResolver,
) -> usize {
    let resolve = resolver.as_fn();
    let root = event.root;
    let by_src = |doc: &mut Document, src: &str| usize::from(enrich_image_by_src(doc, root, src, &resolve));

    match &event.kind {
        ElementKind::Image { image_link } => by_src(doc, image_link),
        ElementKind::ImagePicker { choices } => choices.iter().map(|link| by_src(doc, link)).sum(),
        ElementKind::SignaturePad { background_image } => background_image
            .as_deref()
            .map_or(0, |link| by_src(doc, link)),
        ElementKind::File { page_items } => page_items
            .iter()
            .map(|item| by_src(doc, &item.content))
            .sum(),
        ElementKind::Html => enrich_images_in_container(doc, root, &resolve),
        ElementKind::Other(_) => 0,
    }
}

/// Enrich the logo of a rendered header.
pub fn enrich_rendered_header(
    doc: &mut Document,
    event: &HeaderRendered,
    resolver: &StorageUrlResolver,
) -> bool {
    event
        .logo
        .as_deref()
        .is_some_and(|logo| enrich_image_by_src(doc, event.root, logo, &resolver.as_fn()))
}

/// Subscribe element and header enrichment to a render model.
pub fn register_view_handlers(
    model: &Arc<RenderModel>,
    resolver: Arc<StorageUrlResolver>,
) -> UnregisterHandle {
    let element_resolver = Arc::clone(&resolver);
    let element_sub = model.on_element_rendered(Arc::new(move |doc, event| {
        let changed = enrich_rendered_element(doc, event, &element_resolver);
        trace!(element = %event.name, changed, "Element enriched");
    }));

    let header_sub = model.on_header_rendered(Arc::new(move |doc, event| {
        let changed = enrich_rendered_header(doc, event, &resolver);
        trace!(changed, "Header enriched");
    }));

    UnregisterHandle {
        model: Some(Arc::clone(model)),
        subscriptions: Arc::new(Mutex::new(vec![element_sub, header_sub])),
    }
}

/// Resolve tokens, then bind view handlers, unless cancelled first.
///
/// If `cancel` fires before the tokens resolve, nothing is registered and
/// the model's token slot stays empty. The resolution future is dropped at
/// that point, which aborts any token request still in flight; its result
/// would be discarded anyway. Callers that want the requests to settle
/// should spawn the resolution and pass the join handle.
pub async fn bind_view<F>(
    resolution: F,
    model: &Arc<RenderModel>,
    cancel: &CancellationToken,
) -> Option<UnregisterHandle>
where
    F: Future<Output = ReadTokenProvider>,
{
    tokio::select! {
        () = cancel.cancelled() => {
            debug!("View torn down before read tokens resolved");
            None
        }
        provider = resolution => {
            provider.set_model_metadata(model);
            Some(provider.register_view_handlers(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;
    use crate::enrichment::NodeId;
    use crate::files::ProtectedFile;
    use crate::storage::{
        ACCESS_NOT_ALLOWED_IMAGE, ContainerNames, ContainerReadToken, ReadTokenSet, StorageConfig,
        TokenIssueError,
    };
    use chrono::Utc;

    const BASE: &str = "https://acme.blob.core.windows.net";

    fn config() -> Arc<StorageConfig> {
        Arc::new(StorageConfig {
            is_enabled: true,
            is_private: true,
            host_name: "acme.blob.core.windows.net".to_string(),
            container_names: ContainerNames {
                user_files: "user-files".to_string(),
                content: "content".to_string(),
            },
        })
    }

    fn token(container: &str, value: Option<&str>) -> Result<ContainerReadToken, TokenIssueError> {
        let now = Utc::now();
        Ok(ContainerReadToken {
            token: value.map(String::from),
            container_name: container.to_string(),
            expires_on: now + chrono::Duration::hours(1),
            generated_at: now,
        })
    }

    async fn provider(user_files: Option<&str>, content: Option<&str>) -> ReadTokenProvider {
        ReadTokenProvider::resolve(
            Some(config()),
            async { token("user-files", user_files) },
            async { token("content", content) },
        )
        .await
    }

    fn resolver() -> StorageUrlResolver {
        StorageUrlResolver::new(
            config(),
            Arc::new(ReadTokenSet {
                user_files: token("user-files", Some("sig=u")),
                content: token("content", Some("sig=c")),
            }),
        )
    }

    fn rendered(doc: &mut Document, srcs: &[&str]) -> NodeId {
        let root = doc.root();
        let container = doc.append_element(root, "div", &[]);
        for src in srcs {
            doc.append_element(container, "img", &[("src", src)]);
        }
        container
    }

    fn srcs(doc: &Document, container: NodeId) -> Vec<String> {
        doc.children(container)
            .iter()
            .filter_map(|c| doc.get_attribute(*c, "src").map(String::from))
            .collect()
    }

    #[test]
    fn test_image_element() {
        let mut doc = Document::new();
        let link = format!("{BASE}/content/pic.png");
        let root = rendered(&mut doc, &[&link]);
        let event = ElementRendered {
            name: "q1".to_string(),
            kind: ElementKind::Image { image_link: link.clone() },
            root,
        };

        assert_eq!(enrich_rendered_element(&mut doc, &event, &resolver()), 1);
        assert_eq!(srcs(&doc, root), vec![format!("{link}?sig=c")]);
    }

    #[test]
    fn test_image_picker_enriches_each_choice() {
        let mut doc = Document::new();
        let a = format!("{BASE}/content/a.png");
        let b = format!("{BASE}/content/b.png");
        let external = "https://cdn.example.com/c.png".to_string();
        let root = rendered(&mut doc, &[&a, &b, &external]);
        let event = ElementRendered {
            name: "pick".to_string(),
            kind: ElementKind::ImagePicker {
                choices: vec![a.clone(), b.clone(), external.clone()],
            },
            root,
        };

        assert_eq!(enrich_rendered_element(&mut doc, &event, &resolver()), 2);
        assert_eq!(
            srcs(&doc, root),
            vec![format!("{a}?sig=c"), format!("{b}?sig=c"), external]
        );
    }

    #[test]
    fn test_signature_pad_background() {
        let mut doc = Document::new();
        let bg = format!("{BASE}/content/bg.png");
        let root = rendered(&mut doc, &[&bg]);
        let event = ElementRendered {
            name: "sig".to_string(),
            kind: ElementKind::SignaturePad { background_image: Some(bg.clone()) },
            root,
        };
        assert_eq!(enrich_rendered_element(&mut doc, &event, &resolver()), 1);

        let empty = ElementRendered {
            name: "sig2".to_string(),
            kind: ElementKind::SignaturePad { background_image: None },
            root,
        };
        assert_eq!(enrich_rendered_element(&mut doc, &empty, &resolver()), 0);
    }

    #[test]
    fn test_file_page_items() {
        let mut doc = Document::new();
        let first = format!("{BASE}/user-files/1.jpg");
        let second = format!("{BASE}/user-files/2.jpg");
        let root = rendered(&mut doc, &[&first, &second]);
        let item = |content: &str| ProtectedFile {
            content: content.to_string(),
            name: "x.jpg".to_string(),
            file_type: "image/jpeg".to_string(),
            token: None,
        };
        // Only the first file is on the displayed page.
        let event = ElementRendered {
            name: "files".to_string(),
            kind: ElementKind::File { page_items: vec![item(&first)] },
            root,
        };

        assert_eq!(enrich_rendered_element(&mut doc, &event, &resolver()), 1);
        assert_eq!(srcs(&doc, root), vec![format!("{first}?sig=u"), second]);
    }

    #[test]
    fn test_html_enriches_all_contained_images() {
        let mut doc = Document::new();
        let a = format!("{BASE}/content/a.png");
        let root = rendered(&mut doc, &[&a, &a]);
        let event = ElementRendered {
            name: "html".to_string(),
            kind: ElementKind::Html,
            root,
        };
        assert_eq!(enrich_rendered_element(&mut doc, &event, &resolver()), 2);
    }

    #[test]
    fn test_header_logo() {
        let mut doc = Document::new();
        let logo = format!("{BASE}/content/logo.svg");
        let root = rendered(&mut doc, &[&logo]);

        assert!(!enrich_rendered_header(
            &mut doc,
            &HeaderRendered { root, logo: None },
            &resolver()
        ));
        assert!(enrich_rendered_header(
            &mut doc,
            &HeaderRendered { root, logo: Some(logo.clone()) },
            &resolver()
        ));
        assert_eq!(srcs(&doc, root), vec![format!("{logo}?sig=c")]);
    }

    #[tokio::test]
    async fn test_registered_handlers_enrich_on_emit() {
        let model = Arc::new(RenderModel::new());
        let handle = provider(None, Some("sig=c")).await.register_view_handlers(&model);

        let mut doc = Document::new();
        let denied = format!("{BASE}/user-files/private.png");
        let root = rendered(&mut doc, &[&denied]);
        let event = ElementRendered {
            name: "q".to_string(),
            kind: ElementKind::Image { image_link: denied },
            root,
        };
        model.emit_element_rendered(&mut doc, &event);
        assert_eq!(srcs(&doc, root), vec![ACCESS_NOT_ALLOWED_IMAGE.to_string()]);

        // Re-emitting is a no-op thanks to the mark.
        model.emit_element_rendered(&mut doc, &event);
        assert_eq!(srcs(&doc, root), vec![ACCESS_NOT_ALLOWED_IMAGE.to_string()]);

        handle.unregister();
        assert_eq!(model.handler_count(), 0);
    }

    #[tokio::test]
    async fn test_bind_view_registers_after_resolution() {
        let model = Arc::new(RenderModel::new());
        let cancel = CancellationToken::new();

        let handle = bind_view(provider(Some("sig=u"), Some("sig=c")), &model, &cancel)
            .await
            .expect("bound");

        assert_eq!(model.handler_count(), 2);
        assert!(model.read_tokens().is_some());
        handle.unregister();
    }

    #[tokio::test]
    async fn test_bind_view_cancelled_registers_nothing() {
        let model = Arc::new(RenderModel::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let pending = async {
            std::future::pending::<()>().await;
            ReadTokenProvider::unprotected(None)
        };
        let bound = bind_view(pending, &model, &cancel).await;

        assert!(bound.is_none());
        assert_eq!(model.handler_count(), 0);
        assert!(model.read_tokens().is_none());
    }

    #[tokio::test]
    async fn test_bind_view_cancelled_mid_flight_drops_resolution() {
        struct DropFlag(Arc<AtomicBool>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let model = Arc::new(RenderModel::new());
        let cancel = CancellationToken::new();
        let dropped = Arc::new(AtomicBool::new(false));
        let started = Arc::new(Notify::new());

        let flag = DropFlag(Arc::clone(&dropped));
        let started_tx = Arc::clone(&started);
        let resolution = async move {
            let _flag = flag;
            started_tx.notify_one();
            std::future::pending::<()>().await;
            provider(Some("sig=u"), Some("sig=c")).await
        };

        let canceller = cancel.clone();
        let started_rx = Arc::clone(&started);
        tokio::spawn(async move {
            started_rx.notified().await;
            canceller.cancel();
        });

        let bound = bind_view(resolution, &model, &cancel).await;

        assert!(bound.is_none());
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(model.handler_count(), 0);
        assert!(model.read_tokens().is_none());
    }
}
