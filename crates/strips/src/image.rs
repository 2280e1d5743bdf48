//! Image strips: a still texture shown for the strip's window.

use stripcast_project_model::asset::Asset;
use stripcast_project_model::strip::{ImageStripDescription, Vector3};

use crate::media::{MediaFactory, MediaSlot};
use crate::quad::Quad;
use crate::strip::StripTiming;

pub struct ImageStrip {
    id: String,
    pub timing: StripTiming,
    pub position: Vector3,
    pub percent: Option<f64>,
    slot: MediaSlot,
    quad: Quad,
}

impl ImageStrip {
    pub fn new(
        id: String,
        desc: &ImageStripDescription,
        asset: Option<Asset>,
        factory: &dyn MediaFactory,
    ) -> Self {
        let timing = StripTiming::from(&desc.base);
        let mut quad = Quad::new(desc.position);
        quad.place(desc.position, timing.layer);
        Self {
            id,
            timing,
            position: desc.position,
            percent: desc.percent,
            slot: MediaSlot::bind(asset, factory),
            quad,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.slot.asset()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.is_loaded()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    /// Stills never seek, so the update is synchronous.
    pub fn update(&mut self, time: f64) {
        self.quad.place(self.position, self.timing.layer);
        if let Some(metadata) = self.slot.poll() {
            self.quad
                .scale_to(metadata.width, metadata.height, self.percent.unwrap_or(100.0));
            self.quad.texture = self.slot.media().and_then(|m| m.current_frame());
            tracing::debug!(strip = %self.id, "Image strip loaded");
        }
        self.quad.visible = self.slot.is_loaded() && self.timing.is_active(time);
    }

    pub fn to_description(&self) -> ImageStripDescription {
        ImageStripDescription {
            base: self.timing.to_base(&self.id, self.slot.asset()),
            position: self.position,
            percent: self.percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFactory;
    use stripcast_project_model::asset::AssetKind;
    use stripcast_project_model::strip::StripBase;

    #[test]
    fn test_image_visible_only_inside_window() {
        let factory = MockFactory::loaded(200, 100);
        let desc = ImageStripDescription {
            base: StripBase::new(0.0, 1.0, 4).with_asset("logo", "/m/logo.png"),
            position: Vector3::new(-5.0, 5.0, 0.0),
            percent: None,
        };
        let asset = Asset::new("logo", "logo.png", AssetKind::Image, "/m/logo.png");
        let mut strip = ImageStrip::new("i1".into(), &desc, Some(asset), &factory);

        strip.update(0.5);
        assert!(strip.quad().visible);
        assert!(strip.quad().texture.is_some());
        assert_eq!((strip.quad().width, strip.quad().height), (200.0, 100.0));
        assert_eq!(strip.quad().position.z, 4.0);

        strip.update(1.0);
        assert!(!strip.quad().visible);
        assert_eq!(strip.to_description(), ImageStripDescription {
            base: desc.base.clone().with_id("i1"),
            ..desc
        });
    }

    #[test]
    fn test_unloaded_image_stays_hidden() {
        let factory = MockFactory::unloaded();
        let desc = ImageStripDescription {
            base: StripBase::new(0.0, 1.0, 0).with_asset("logo", "/m/logo.png"),
            position: Vector3::ZERO,
            percent: None,
        };
        let asset = Asset::new("logo", "logo.png", AssetKind::Image, "/m/logo.png");
        let mut strip = ImageStrip::new("i1".into(), &desc, Some(asset), &factory);
        strip.update(0.5);
        assert!(!strip.quad().visible);
    }
}
