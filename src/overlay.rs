//! Screen-space text drawn on top of the finished frame.

use std::fmt::Write;

use chrono::{
    format::{Item, StrftimeItems},
    NaiveTime,
};
use glam::Vec2;

use crate::config::{OverlayOptions, DEFAULT_CLOCK_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub text: String,
    pub corner: Corner,
    pub font_size: f32,
}

pub struct Overlay {
    options: OverlayOptions,
}

impl Overlay {
    pub fn new(mut options: OverlayOptions) -> Self {
        if format_clock(NaiveTime::default(), &options.clock_format).is_none() {
            log::warn!(
                "Unusable clock format {:?}, using {DEFAULT_CLOCK_FORMAT:?}",
                options.clock_format
            );
            options.clock_format = DEFAULT_CLOCK_FORMAT.to_owned();
        }

        Self { options }
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn color(&self) -> [u8; 3] {
        self.options.color
    }

    pub fn margin(&self) -> f32 {
        self.options.margin
    }

    /// Title and clock along the top edge, instructions and link along the bottom.
    pub fn items(&self, now: NaiveTime) -> Vec<OverlayItem> {
        let options = &self.options;
        let item = |text: String, corner, font_size| OverlayItem {
            text,
            corner,
            font_size,
        };

        vec![
            item(options.title.clone(), Corner::TopLeft, options.title_font_size),
            item(
                format_clock(now, &options.clock_format).unwrap_or_default(),
                Corner::TopRight,
                options.font_size,
            ),
            item(
                options.instructions.join("\n"),
                Corner::BottomLeft,
                options.font_size,
            ),
            item(options.link.clone(), Corner::BottomRight, options.font_size),
        ]
    }
}

/// Formats `now` with a strftime string, or `None` when the string has an
/// unknown specifier or asks for date fields a bare time does not have.
pub fn format_clock(now: NaiveTime, format: &str) -> Option<String> {
    let items = StrftimeItems::new(format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut text = String::new();
    write!(text, "{}", now.format_with_items(items)).ok()?;
    Some(text)
}

/// Top-left position for a block of `size` pinned to `corner`.
pub fn anchor(corner: Corner, size: Vec2, viewport: Vec2, margin: f32) -> Vec2 {
    let right = viewport.x - margin - size.x;
    let bottom = viewport.y - margin - size.y;

    match corner {
        Corner::TopLeft => Vec2::new(margin, margin),
        Corner::TopRight => Vec2::new(right, margin),
        Corner::BottomLeft => Vec2::new(margin, bottom),
        Corner::BottomRight => Vec2::new(right, bottom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_cover_all_corners() {
        let overlay = Overlay::new(OverlayOptions::default());
        let items = overlay.items(NaiveTime::from_hms_opt(14, 5, 9).unwrap());

        let corners: Vec<_> = items.iter().map(|item| item.corner).collect();
        assert_eq!(
            corners,
            [
                Corner::TopLeft,
                Corner::TopRight,
                Corner::BottomLeft,
                Corner::BottomRight
            ]
        );
        assert_eq!(items[0].text, "bolt.new");
        assert_eq!(items[1].text, "2:05:09 PM");
        assert_eq!(
            items[2].text,
            "DRAG to rotate | SCROLL to zoom\nHOVER over orbs to interact"
        );
        assert_eq!(items[3].text, "x.com/sagevedant");
        assert!(items[0].font_size > items[1].font_size);
    }

    #[test]
    fn custom_clock_format() {
        let overlay = Overlay::new(OverlayOptions {
            clock_format: "%H:%M".to_owned(),
            ..Default::default()
        });
        let items = overlay.items(NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert_eq!(items[1].text, "23:59");
    }

    #[test]
    fn date_fields_and_bad_specifiers_do_not_format() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(format_clock(noon, "%H:%M").as_deref(), Some("12:00"));
        assert_eq!(format_clock(noon, "%Y-%m-%d"), None);
        assert_eq!(format_clock(noon, "%Q"), None);
    }

    #[test]
    fn unusable_clock_format_falls_back_to_default() {
        let overlay = Overlay::new(OverlayOptions {
            clock_format: "%Y-%m-%d".to_owned(),
            ..Default::default()
        });
        let items = overlay.items(NaiveTime::from_hms_opt(14, 5, 9).unwrap());
        assert_eq!(items[1].text, "2:05:09 PM");
    }

    #[test]
    fn anchors_stay_inside_viewport() {
        let viewport = Vec2::new(1280.0, 720.0);
        let size = Vec2::new(200.0, 40.0);

        assert_eq!(anchor(Corner::TopLeft, size, viewport, 16.0), Vec2::new(16.0, 16.0));
        assert_eq!(
            anchor(Corner::TopRight, size, viewport, 16.0),
            Vec2::new(1064.0, 16.0)
        );
        assert_eq!(
            anchor(Corner::BottomLeft, size, viewport, 16.0),
            Vec2::new(16.0, 664.0)
        );
        assert_eq!(
            anchor(Corner::BottomRight, size, viewport, 16.0),
            Vec2::new(1064.0, 664.0)
        );
    }
}
