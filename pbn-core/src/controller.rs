use std::cell::RefCell;

use crate::color::Rgb;
use crate::error::AssetError;
use crate::fill::{Click, FillState};
use crate::region_map::ShapeId;
use crate::resolver::{
    AssetResolver, Clock, Generator, ImageRef, LocalAssets, ObjectStore, ResolvedAsset,
    VectorArt,
};

/// Identity of one image switch. Completing with a ticket from an older
/// switch is detected and dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    image: ImageRef,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }
}

/// Whether a completed resolution was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Current,
    Stale,
}

/// What the presentation layer should show around the picture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Empty,
    Loading(ImageRef),
    Failed {
        image: ImageRef,
        message: String,
        retryable: bool,
    },
    Ready(ImageRef),
}

/// Owns the picture currently on screen and its fill state.
#[derive(Debug)]
pub struct ColoringController {
    epoch: u64,
    view: View,
    fill: Option<FillState>,
    art: Option<VectorArt>,
}

impl Default for ColoringController {
    fn default() -> Self {
        ColoringController {
            epoch: 0,
            view: View::Empty,
            fill: None,
            art: None,
        }
    }
}

impl ColoringController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn fill(&self) -> Option<&FillState> {
        self.fill.as_ref()
    }

    pub fn art(&self) -> Option<&VectorArt> {
        self.art.as_ref()
    }

    pub fn current_image(&self) -> Option<&ImageRef> {
        match &self.view {
            View::Empty => None,
            View::Loading(image) | View::Ready(image) | View::Failed { image, .. } => Some(image),
        }
    }

    /// Start showing `image`. The previous picture is discarded immediately
    /// and any resolution still running for it becomes stale.
    pub fn switch_image(&mut self, image: ImageRef) -> Ticket {
        self.epoch += 1;
        self.fill = None;
        self.art = None;
        self.view = View::Loading(image.clone());
        log::debug!("switching to {image} (epoch {})", self.epoch);
        Ticket {
            epoch: self.epoch,
            image,
        }
    }

    /// Re-issue the current image after a retryable failure.
    pub fn retry(&mut self) -> Option<Ticket> {
        let View::Failed {
            image,
            retryable: true,
            ..
        } = &self.view
        else {
            return None;
        };
        let image = image.clone();
        Some(self.switch_image(image))
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    pub fn complete(
        &mut self,
        ticket: &Ticket,
        result: Result<ResolvedAsset, AssetError>,
    ) -> Resolution {
        if !self.is_current(ticket) {
            log::debug!(
                "dropping stale resolution for {} (epoch {} < {})",
                ticket.image,
                ticket.epoch,
                self.epoch
            );
            return Resolution::Stale;
        }
        match result {
            Ok(asset) => {
                self.fill = Some(FillState::new(asset.map));
                self.art = Some(asset.art);
                self.view = View::Ready(ticket.image.clone());
            }
            Err(err) => {
                log::warn!("could not resolve {}: {err}", ticket.image);
                self.view = View::Failed {
                    image: ticket.image.clone(),
                    message: err.user_message().to_string(),
                    retryable: err.is_retryable(),
                };
            }
        }
        Resolution::Current
    }

    pub fn select_color(&mut self, color: Rgb) -> Vec<ShapeId> {
        self.fill
            .as_mut()
            .map(|f| f.select_color(color))
            .unwrap_or_default()
    }

    pub fn click_region(&mut self, shape: &ShapeId) -> Click {
        self.fill
            .as_mut()
            .map_or(Click::Ignored, |f| f.click_region(shape))
    }

    pub fn fill_all(&mut self) -> Vec<ShapeId> {
        self.fill.as_mut().map(FillState::fill_all).unwrap_or_default()
    }

    pub fn clear_all(&mut self) -> Vec<ShapeId> {
        self.fill.as_mut().map(FillState::clear_all).unwrap_or_default()
    }

    pub fn is_color_complete(&self, color: Rgb) -> bool {
        self.fill.as_ref().is_some_and(|f| f.is_color_complete(color))
    }
}

/// Run the resolution for `ticket` and apply it to `controller`.
///
/// The controller is only borrowed after the resolver returns, so other
/// handlers (including a newer switch) may run while this one is suspended.
pub async fn resolve_into<L, S, G, C>(
    controller: &RefCell<ColoringController>,
    resolver: &AssetResolver<L, S, G, C>,
    ticket: Ticket,
) -> Resolution
where
    L: LocalAssets,
    S: ObjectStore,
    G: Generator,
    C: Clock,
{
    let result = resolver.resolve(ticket.image()).await;
    controller.borrow_mut().complete(&ticket, result)
}

pub async fn switch_and_resolve<L, S, G, C>(
    controller: &RefCell<ColoringController>,
    resolver: &AssetResolver<L, S, G, C>,
    image: ImageRef,
) -> Resolution
where
    L: LocalAssets,
    S: ObjectStore,
    G: Generator,
    C: Clock,
{
    let ticket = controller.borrow_mut().switch_image(image);
    resolve_into(controller, resolver, ticket).await
}
