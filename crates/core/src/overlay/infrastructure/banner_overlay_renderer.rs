use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::compliance::domain::compliance_category::ComplianceCategory;
use crate::compliance::domain::frame_aggregator::FrameAnalysis;
use crate::detection::domain::detection::Detection;
use crate::overlay::domain::overlay_content::{ComplianceStatus, OverlayContent};
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::frame::Frame;

/// Bundled so the overlay renders the same on every host.
const FONT_BYTES: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans-Bold.ttf");

const VIOLATION_RED: Rgb<u8> = Rgb([255, 0, 0]);
const COMPLIANT_GREEN: Rgb<u8> = Rgb([0, 180, 0]);
const INFO_BAR_GRAY: Rgb<u8> = Rgb([40, 40, 40]);
const BANNER_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const SECONDARY_TEXT: Rgb<u8> = Rgb([255, 255, 0]);
const TIMESTAMP_TEXT: Rgb<u8> = Rgb([200, 200, 200]);

const PROTECTIVE_BOX: Rgb<u8> = Rgb([0, 200, 0]);
const AUXILIARY_BOX: Rgb<u8> = Rgb([255, 176, 0]);
const UNCLASSIFIED_BOX: Rgb<u8> = Rgb([150, 150, 150]);
const BOX_LABEL_TEXT: Rgb<u8> = Rgb([0, 0, 0]);

const BANNER_HEIGHT: u32 = 140;
const INFO_BAR_HEIGHT: u32 = 60;
const MARGIN: i32 = 15;
const BOX_THICKNESS: i32 = 2;

/// Text heights in pixels at 1x.
const STATUS_TEXT_PX: f32 = 36.0;
const BODY_TEXT_PX: f32 = 20.0;
const LABEL_TEXT_PX: f32 = 15.0;

/// Widths at which text is drawn at 1x; wider frames scale up.
const BASE_WIDTH: u32 = 640;

/// Draws boxes per detection, a status banner across the top and an
/// information bar across the bottom.
///
/// Layout at 1x: status at y=15, counts at y=70, violations at y=100 inside
/// a 140 px banner; secondary counts and the timestamp centred in a 60 px
/// bar. Banner and bar shrink on frames too small to hold them.
pub struct BannerOverlayRenderer {
    font: FontArc,
}

impl BannerOverlayRenderer {
    /// Renderer using the bundled DejaVu Sans Bold face.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::with_font(FontArc::try_from_slice(FONT_BYTES)?))
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font }
    }
}

impl OverlayRenderer for BannerOverlayRenderer {
    fn render(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
        analysis: &FrameAnalysis,
        content: &OverlayContent,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut img = frame
            .to_rgb_image()
            .ok_or("overlay needs a 3-channel RGB frame")?;
        let scale = (img.width() / BASE_WIDTH).max(1);

        for (detection, category) in detections.iter().zip(&analysis.categories) {
            self.draw_detection(&mut img, detection, *category, scale);
        }
        self.draw_banner(&mut img, content, scale);
        self.draw_info_bar(&mut img, content, scale);

        frame.copy_from_rgb_image(&img)?;
        Ok(())
    }
}

fn box_color(category: ComplianceCategory) -> Rgb<u8> {
    if category.is_violation() {
        VIOLATION_RED
    } else if category.is_protective() {
        PROTECTIVE_BOX
    } else if category == ComplianceCategory::Unclassified {
        UNCLASSIFIED_BOX
    } else {
        AUXILIARY_BOX
    }
}

fn banner_color(status: ComplianceStatus) -> Rgb<u8> {
    match status {
        ComplianceStatus::Violation => VIOLATION_RED,
        ComplianceStatus::Compliant => COMPLIANT_GREEN,
    }
}

fn fill(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
    if w > 0 && h > 0 {
        draw_filled_rect_mut(img, Rect::at(x, y).of_size(w, h), color);
    }
}

impl BannerOverlayRenderer {
    fn draw_detection(
        &self,
        img: &mut RgbImage,
        detection: &Detection,
        category: ComplianceCategory,
        scale: u32,
    ) {
        let Some((x, y, w, h)) = detection.bbox.clamped(img.width(), img.height()) else {
            return;
        };
        let color = box_color(category);

        for inset in 0..BOX_THICKNESS {
            let (iw, ih) = (w as i32 - 2 * inset, h as i32 - 2 * inset);
            if iw <= 0 || ih <= 0 {
                break;
            }
            draw_hollow_rect_mut(
                img,
                Rect::at(x + inset, y + inset).of_size(iw as u32, ih as u32),
                color,
            );
        }

        let label = format!("{} {:.2}", detection.label, detection.confidence);
        let px = text_px(LABEL_TEXT_PX, scale);
        let (text_w, _) = text_size(px, &self.font, &label);
        let label_h = px.y.ceil() as u32 + 4;
        let label_y = if y >= label_h as i32 { y - label_h as i32 } else { y };
        fill(img, x, label_y, text_w + 4, label_h, color);
        draw_text_mut(img, BOX_LABEL_TEXT, x + 2, label_y + 2, px, &self.font, &label);
    }

    fn draw_banner(&self, img: &mut RgbImage, content: &OverlayContent, scale: u32) {
        let height = (BANNER_HEIGHT * scale).min(img.height() / 2);
        fill(img, 0, 0, img.width(), height, banner_color(content.status));

        let s = scale as i32;
        let status_px = text_px(STATUS_TEXT_PX, scale);
        let body_px = text_px(BODY_TEXT_PX, scale);
        draw_text_mut(img, BANNER_TEXT, MARGIN * s, 15 * s, status_px, &self.font, &content.status_line);
        draw_text_mut(img, BANNER_TEXT, MARGIN * s, 70 * s, body_px, &self.font, &content.counts_line);
        draw_text_mut(img, BANNER_TEXT, MARGIN * s, 100 * s, body_px, &self.font, &content.violations_line);
    }

    fn draw_info_bar(&self, img: &mut RgbImage, content: &OverlayContent, scale: u32) {
        let height = (INFO_BAR_HEIGHT * scale).min(img.height() / 4);
        let top = img.height() - height;
        fill(img, 0, top as i32, img.width(), height, INFO_BAR_GRAY);

        let px = text_px(BODY_TEXT_PX, scale);
        let margin = MARGIN * scale as i32;
        let text_y = top as i32 + (height as i32 - px.y as i32) / 2;
        draw_text_mut(img, SECONDARY_TEXT, margin, text_y, px, &self.font, &content.secondary_line);

        let (ts_w, _) = text_size(px, &self.font, &content.timestamp);
        let ts_x = img.width() as i32 - ts_w as i32 - margin;
        draw_text_mut(img, TIMESTAMP_TEXT, ts_x, text_y, px, &self.font, &content.timestamp);
    }
}

fn text_px(base: f32, scale: u32) -> PxScale {
    PxScale::from(base * scale as f32)
}
