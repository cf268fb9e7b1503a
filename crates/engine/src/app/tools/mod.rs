mod overlay;

pub(crate) use overlay::{build_overlay_panel, OverlayData};
