use crate::app::rendering::{text_width_px, LINE_ADVANCE_PX};
use crate::app::{LoopMetricsSnapshot, ScreenRect, UiPanel};

const OVERLAY_MARGIN_PX: f32 = 12.0;
const OVERLAY_INSET_PX: f32 = 12.0;
const OVERLAY_TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const OVERLAY_TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const OVERLAY_PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 210];
const OVERLAY_PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const PERF_SECTION_LABEL: &str = "Perf";
const SCENE_SECTION_LABEL: &str = "Scene";

#[derive(Debug, Clone)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub slow_frame_delay_ms: u64,
    pub entity_count: usize,
    pub scene_lines: Vec<String>,
}

/// Perf panel anchored to the top-right corner so it does not cover the
/// scene's own top-left status text.
pub(crate) fn build_overlay_panel(data: &OverlayData, window_size: (u32, u32)) -> UiPanel {
    let lines = build_overlay_lines(data);
    let longest_px = lines
        .iter()
        .map(|line| text_width_px(line))
        .max()
        .unwrap_or(0) as f32;
    let width = longest_px + OVERLAY_INSET_PX * 2.0;
    let height = lines.len() as f32 * LINE_ADVANCE_PX as f32 + OVERLAY_INSET_PX * 2.0;
    let x = (window_size.0 as f32 - width - OVERLAY_MARGIN_PX).max(0.0);
    let rect = ScreenRect::new(x, OVERLAY_MARGIN_PX, width, height);

    let mut panel =
        UiPanel::new(rect, OVERLAY_PANEL_BG_COLOR).with_border(OVERLAY_PANEL_BORDER_COLOR);
    for line in lines {
        let color = overlay_line_color(&line);
        panel = panel.with_line(line, color);
    }
    panel
}

fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    let mut lines = vec![
        PERF_SECTION_LABEL.to_string(),
        format_fps_line(
            data.metrics.fps,
            data.render_fps_cap,
            data.slow_frame_delay_ms,
        ),
        format!("TPS: {:.1}", data.metrics.tps),
        format!("Frame: {:.2} ms", data.metrics.frame_time_ms),
        format!("Dropped: {} ms", data.metrics.dropped_backlog_ms),
        String::new(),
        SCENE_SECTION_LABEL.to_string(),
        format!("Entities: {}", data.entity_count),
    ];
    lines.extend(data.scene_lines.iter().cloned());
    lines
}

fn overlay_line_color(line: &str) -> [u8; 4] {
    if matches!(line, PERF_SECTION_LABEL | SCENE_SECTION_LABEL) {
        OVERLAY_TEXT_DIM_COLOR
    } else {
        OVERLAY_TEXT_PRIMARY_COLOR
    }
}

fn format_fps_line(current_fps: f32, cap: Option<u32>, slow_frame_delay_ms: u64) -> String {
    let cap_text = match cap {
        Some(value) => value.to_string(),
        None => "inf".to_string(),
    };
    format!(
        "[{:.0} / {}] dbg+{}ms",
        current_fps, cap_text, slow_frame_delay_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OverlayData {
        OverlayData {
            metrics: LoopMetricsSnapshot {
                fps: 59.6,
                tps: 60.0,
                frame_time_ms: 16.7,
                dropped_backlog_ms: 0,
            },
            render_fps_cap: None,
            slow_frame_delay_ms: 0,
            entity_count: 21,
            scene_lines: vec!["pos: 4.5,4.5".to_string()],
        }
    }

    #[test]
    fn lines_list_perf_then_scene_sections() {
        let lines = build_overlay_lines(&sample());
        assert_eq!(lines[0], PERF_SECTION_LABEL);
        assert_eq!(lines[1], "[60 / inf] dbg+0ms");
        assert_eq!(lines[6], SCENE_SECTION_LABEL);
        assert_eq!(lines[7], "Entities: 21");
        assert_eq!(lines.last().map(String::as_str), Some("pos: 4.5,4.5"));
    }

    #[test]
    fn panel_hugs_top_right_corner() {
        let panel = build_overlay_panel(&sample(), (1280, 720));
        let right = panel.rect.x + panel.rect.width;
        assert!((right - (1280.0 - OVERLAY_MARGIN_PX)).abs() < 0.001);
        assert_eq!(panel.rect.y, OVERLAY_MARGIN_PX);
        assert_eq!(panel.lines[0].color, OVERLAY_TEXT_DIM_COLOR);
        assert_eq!(panel.lines[2].color, OVERLAY_TEXT_PRIMARY_COLOR);
    }

    #[test]
    fn narrow_window_pins_panel_to_left_edge() {
        let panel = build_overlay_panel(&sample(), (40, 40));
        assert_eq!(panel.rect.x, 0.0);
    }

    #[test]
    fn fps_line_formats_cap_on_and_debug_delay() {
        assert_eq!(format_fps_line(144.4, Some(240), 200), "[144 / 240] dbg+200ms");
    }
}
