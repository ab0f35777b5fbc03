use scene::PartnerCategory;
use serde::Serialize;

/// Stroke of an animated route line.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: f32,
    pub opacity: f32,
    pub dash_array: &'static str,
}

impl LineStyle {
    pub const fn new(
        color: &'static str,
        weight: f32,
        opacity: f32,
        dash_array: &'static str,
    ) -> Self {
        Self {
            color,
            weight,
            opacity,
            dash_array,
        }
    }

    pub const PURCHASE: LineStyle = LineStyle::new("green", 3.0, 0.7, "5, 5");
    pub const SALE: LineStyle = LineStyle::new("blue", 3.0, 0.7, "10, 10");

    pub fn for_category(category: PartnerCategory) -> Self {
        match category {
            PartnerCategory::Purchase => Self::PURCHASE,
            PartnerCategory::Sale => Self::SALE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PopupStyle {
    pub min_width: u32,
    pub max_width: u32,
}

impl Default for PopupStyle {
    fn default() -> Self {
        Self {
            min_width: 200,
            max_width: 300,
        }
    }
}
