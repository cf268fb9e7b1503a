use engine::{
    text_width_px, wrap_text, InputAction, InputSnapshot, ScreenRect, UiPanel, Vec2,
    GLYPH_ADVANCE_PX, LINE_ADVANCE_PX,
};

use super::interaction::{Action, UiEvent};
use super::motion::DirectionInput;
use super::stats::KarmaBand;

const MARGIN_PX: f32 = 12.0;
const INSET_PX: f32 = 12.0;
const MENU_WIDTH_PX: f32 = 320.0;
const BUTTON_HEIGHT_PX: f32 = 40.0;
const BUTTON_GAP_PX: f32 = 8.0;
const MESSAGE_MAX_WIDTH_PX: f32 = 640.0;
const MESSAGE_BUTTON_WIDTH_PX: f32 = 120.0;
const DPAD_CELL_PX: f32 = 56.0;
const DPAD_MARGIN_PX: f32 = 24.0;

const TEXT_COLOR: [u8; 4] = [244, 248, 252, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const STATUS_BG_COLOR: [u8; 4] = [0, 0, 0, 160];
const PANEL_BG_COLOR: [u8; 4] = [20, 24, 32, 230];
const PANEL_BORDER_COLOR: [u8; 4] = [189, 195, 199, 255];
const BUTTON_BG_COLOR: [u8; 4] = [52, 73, 94, 255];
const CANCEL_BG_COLOR: [u8; 4] = [90, 52, 52, 255];
const DPAD_BG_COLOR: [u8; 4] = [255, 255, 255, 70];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DpadButton {
    Up,
    Down,
    Left,
    Right,
}

impl DpadButton {
    const ALL: [DpadButton; 4] = [
        DpadButton::Up,
        DpadButton::Down,
        DpadButton::Left,
        DpadButton::Right,
    ];

    fn label(self) -> &'static str {
        match self {
            DpadButton::Up => "UP",
            DpadButton::Down => "DN",
            DpadButton::Left => "<",
            DpadButton::Right => ">",
        }
    }

    /// Column and row inside the 3x3 pad.
    fn cell(self) -> (f32, f32) {
        match self {
            DpadButton::Up => (1.0, 0.0),
            DpadButton::Left => (0.0, 1.0),
            DpadButton::Right => (2.0, 1.0),
            DpadButton::Down => (1.0, 2.0),
        }
    }
}

/// What the HUD shows this tick.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HudView<'a> {
    pub district_label: &'a str,
    pub influence: u32,
    pub karma_band: KarmaBand,
    pub menu_target: Option<&'a str>,
    pub message: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MenuLayout {
    pub panel: ScreenRect,
    pub buttons: Vec<(UiEvent, ScreenRect)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MessageLayout {
    pub panel: ScreenRect,
    pub lines: Vec<String>,
    pub close_button: ScreenRect,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HudLayout {
    pub status: ScreenRect,
    pub menu: Option<MenuLayout>,
    pub message: Option<MessageLayout>,
    pub dpad: Vec<(DpadButton, ScreenRect)>,
}

pub(crate) fn layout(view: &HudView<'_>, window_size: (u32, u32)) -> HudLayout {
    let (width, height) = (window_size.0 as f32, window_size.1 as f32);
    let line_px = LINE_ADVANCE_PX as f32;

    let status = ScreenRect::new(MARGIN_PX, MARGIN_PX, 280.0, 3.0 * line_px + INSET_PX * 2.0);

    let menu = view.menu_target.map(|_| {
        let button_count = Action::ALL.len() as f32 + 1.0;
        let panel_height = INSET_PX * 2.0
            + line_px
            + BUTTON_GAP_PX
            + button_count * (BUTTON_HEIGHT_PX + BUTTON_GAP_PX);
        let panel = ScreenRect::new(
            ((width - MENU_WIDTH_PX) * 0.5).max(0.0),
            ((height - panel_height) * 0.5).max(0.0),
            MENU_WIDTH_PX,
            panel_height,
        );
        let events = Action::ALL
            .iter()
            .map(|action| UiEvent::Action(*action))
            .chain(std::iter::once(UiEvent::CloseMenu));
        let mut y = panel.y + INSET_PX + line_px + BUTTON_GAP_PX;
        let buttons = events
            .map(|event| {
                let rect = ScreenRect::new(
                    panel.x + INSET_PX,
                    y,
                    MENU_WIDTH_PX - INSET_PX * 2.0,
                    BUTTON_HEIGHT_PX,
                );
                y += BUTTON_HEIGHT_PX + BUTTON_GAP_PX;
                (event, rect)
            })
            .collect();
        MenuLayout { panel, buttons }
    });

    let message = view.message.map(|text| {
        let panel_width = (width - MARGIN_PX * 2.0).clamp(1.0, MESSAGE_MAX_WIDTH_PX);
        let max_chars = ((panel_width - INSET_PX * 2.0) / GLYPH_ADVANCE_PX as f32).max(1.0) as usize;
        let lines = wrap_text(text, max_chars);
        let panel_height = INSET_PX * 3.0 + lines.len() as f32 * line_px + BUTTON_HEIGHT_PX;
        let panel = ScreenRect::new(
            ((width - panel_width) * 0.5).max(0.0),
            (height - panel_height - MARGIN_PX).max(0.0),
            panel_width,
            panel_height,
        );
        let close_button = ScreenRect::new(
            panel.x + panel.width - INSET_PX - MESSAGE_BUTTON_WIDTH_PX,
            panel.y + panel.height - INSET_PX - BUTTON_HEIGHT_PX,
            MESSAGE_BUTTON_WIDTH_PX,
            BUTTON_HEIGHT_PX,
        );
        MessageLayout {
            panel,
            lines,
            close_button,
        }
    });

    let pad_top = height - DPAD_MARGIN_PX - DPAD_CELL_PX * 3.0;
    let dpad = DpadButton::ALL
        .iter()
        .map(|button| {
            let (col, row) = button.cell();
            let rect = ScreenRect::new(
                DPAD_MARGIN_PX + col * DPAD_CELL_PX,
                pad_top + row * DPAD_CELL_PX,
                DPAD_CELL_PX,
                DPAD_CELL_PX,
            );
            (*button, rect)
        })
        .collect();

    HudLayout {
        status,
        menu,
        message,
        dpad,
    }
}

/// Menu buttons sit above the message box, which sits above the pad.
pub(crate) fn event_at(layout: &HudLayout, point: Vec2) -> Option<UiEvent> {
    if let Some(menu) = &layout.menu {
        let hit = menu
            .buttons
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(event, _)| *event);
        if hit.is_some() {
            return hit;
        }
    }
    layout
        .message
        .as_ref()
        .filter(|message| message.close_button.contains(point))
        .map(|_| UiEvent::CloseMessage)
}

pub(crate) fn dpad_held(layout: &HudLayout, input: &InputSnapshot) -> DirectionInput {
    let mut held = DirectionInput::default();
    let Some(point) = input.pointer_position_px().filter(|_| input.pointer_down()) else {
        return held;
    };
    for (button, rect) in &layout.dpad {
        if rect.contains(point) {
            match button {
                DpadButton::Up => held.up = true,
                DpadButton::Down => held.down = true,
                DpadButton::Left => held.left = true,
                DpadButton::Right => held.right = true,
            }
        }
    }
    held
}

/// Keys for the menu (1/2/3, Esc) and for dismissing the message
/// (Enter/Space, Esc). The menu takes precedence.
pub(crate) fn keyboard_event(
    input: &InputSnapshot,
    menu_open: bool,
    message_shown: bool,
) -> Option<UiEvent> {
    if menu_open {
        return [
            (InputAction::ChoiceOne, UiEvent::Action(Action::Talk)),
            (InputAction::ChoiceTwo, UiEvent::Action(Action::Bribe)),
            (InputAction::ChoiceThree, UiEvent::Action(Action::Punch)),
            (InputAction::Cancel, UiEvent::CloseMenu),
        ]
        .into_iter()
        .find(|(key, _)| input.was_pressed(*key))
        .map(|(_, event)| event);
    }
    let dismiss = input.was_pressed(InputAction::Confirm) || input.was_pressed(InputAction::Cancel);
    (message_shown && dismiss).then_some(UiEvent::CloseMessage)
}

pub(crate) fn build_panels(view: &HudView<'_>, layout: &HudLayout) -> Vec<UiPanel> {
    let mut panels = vec![UiPanel::new(layout.status, STATUS_BG_COLOR)
        .with_line(view.district_label, TEXT_DIM_COLOR)
        .with_line(format!("Influence: {}%", view.influence), TEXT_COLOR)
        .with_line(format!("Karma: {}", view.karma_band.label()), TEXT_COLOR)];

    for (button, rect) in &layout.dpad {
        panels.push(
            UiPanel::new(*rect, DPAD_BG_COLOR)
                .with_line(button.label(), TEXT_COLOR)
                .centered(),
        );
    }

    if let Some(message) = &layout.message {
        let mut panel =
            UiPanel::new(message.panel, PANEL_BG_COLOR).with_border(PANEL_BORDER_COLOR);
        for line in &message.lines {
            panel = panel.with_line(line.clone(), TEXT_COLOR);
        }
        panels.push(panel);
        panels.push(
            UiPanel::new(message.close_button, BUTTON_BG_COLOR)
                .with_line("OK", TEXT_COLOR)
                .centered(),
        );
    }

    if let (Some(menu), Some(target)) = (&layout.menu, view.menu_target) {
        let title_width = text_width_px(target) as f32;
        let title_rect = ScreenRect::new(
            menu.panel.x + ((menu.panel.width - title_width) * 0.5).max(0.0) - INSET_PX,
            menu.panel.y,
            title_width + INSET_PX * 2.0,
            INSET_PX * 2.0 + LINE_ADVANCE_PX as f32,
        );
        panels.push(UiPanel::new(menu.panel, PANEL_BG_COLOR).with_border(PANEL_BORDER_COLOR));
        panels.push(UiPanel::new(title_rect, [0, 0, 0, 0]).with_line(target, TEXT_COLOR));
        for (event, rect) in &menu.buttons {
            let (label, background) = button_face(*event);
            panels.push(
                UiPanel::new(*rect, background)
                    .with_line(label, TEXT_COLOR)
                    .centered(),
            );
        }
    }

    panels
}

fn button_face(event: UiEvent) -> (&'static str, [u8; 4]) {
    match event {
        UiEvent::Action(Action::Talk) => ("1 Talk", BUTTON_BG_COLOR),
        UiEvent::Action(Action::Bribe) => ("2 Bribe", BUTTON_BG_COLOR),
        UiEvent::Action(Action::Punch) => ("3 Punch", BUTTON_BG_COLOR),
        UiEvent::CloseMenu | UiEvent::CloseMessage => ("Esc Cancel", CANCEL_BG_COLOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: (u32, u32) = (1280, 720);

    fn view<'a>(menu_target: Option<&'a str>, message: Option<&'a str>) -> HudView<'a> {
        HudView {
            district_label: "Riverside Ward",
            influence: 12,
            karma_band: KarmaBand::Notorious,
            menu_target,
            message,
        }
    }

    fn center(rect: &ScreenRect) -> Vec2 {
        Vec2::new(rect.x + rect.width * 0.5, rect.y + rect.height * 0.5)
    }

    #[test]
    fn menu_buttons_map_to_events_in_order() {
        let hud = layout(&view(Some("Resident 3"), None), WINDOW);
        let menu = hud.menu.as_ref().expect("menu");
        let events = menu
            .buttons
            .iter()
            .map(|(_, rect)| event_at(&hud, center(rect)))
            .collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                Some(UiEvent::Action(Action::Talk)),
                Some(UiEvent::Action(Action::Bribe)),
                Some(UiEvent::Action(Action::Punch)),
                Some(UiEvent::CloseMenu),
            ]
        );
        for (_, rect) in &menu.buttons {
            assert!(rect.y + rect.height <= menu.panel.y + menu.panel.height);
        }
    }

    #[test]
    fn message_close_button_hit_and_miss() {
        let hud = layout(&view(None, Some("Resident 1: hello")), WINDOW);
        let message = hud.message.as_ref().expect("message");
        assert_eq!(
            event_at(&hud, center(&message.close_button)),
            Some(UiEvent::CloseMessage)
        );
        assert_eq!(event_at(&hud, Vec2::new(1.0, 1.0)), None);
    }

    #[test]
    fn long_messages_wrap_inside_panel() {
        let text = "Kato punched Resident 12!\nResident 12: \"Ouch!!\" and a much longer tail that will not fit";
        let hud = layout(&view(None, Some(text)), (400, 600));
        let message = hud.message.expect("message");
        assert!(message.lines.len() > 2);
        for line in &message.lines {
            assert!(text_width_px(line) as f32 <= message.panel.width - INSET_PX * 2.0);
        }
    }

    #[test]
    fn pressed_pointer_on_pad_holds_direction() {
        let hud = layout(&view(None, None), WINDOW);
        let (_, left_rect) = hud
            .dpad
            .iter()
            .find(|(button, _)| *button == DpadButton::Left)
            .expect("left");
        let pressed = InputSnapshot::empty().with_pointer(Some(center(left_rect)), true, false);
        let held = dpad_held(&hud, &pressed);
        assert!(held.left && !held.right && !held.up && !held.down);

        let hovering = InputSnapshot::empty().with_pointer(Some(center(left_rect)), false, false);
        assert_eq!(dpad_held(&hud, &hovering), DirectionInput::default());
    }

    #[test]
    fn keys_pick_menu_choices_then_dismiss_messages() {
        let punch = InputSnapshot::empty().with_action_tapped(InputAction::ChoiceThree);
        assert_eq!(
            keyboard_event(&punch, true, false),
            Some(UiEvent::Action(Action::Punch))
        );
        assert_eq!(keyboard_event(&punch, false, true), None);

        let escape = InputSnapshot::empty().with_action_tapped(InputAction::Cancel);
        assert_eq!(keyboard_event(&escape, true, false), Some(UiEvent::CloseMenu));
        assert_eq!(
            keyboard_event(&escape, false, true),
            Some(UiEvent::CloseMessage)
        );
        assert_eq!(keyboard_event(&escape, false, false), None);
    }

    #[test]
    fn status_panel_shows_influence_and_band() {
        let v = view(None, None);
        let panels = build_panels(&v, &layout(&v, WINDOW));
        let texts = panels[0]
            .lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["Riverside Ward", "Influence: 12%", "Karma: notorious"]);
    }

    #[test]
    fn menu_panels_include_target_name() {
        let v = view(Some("Resident 7"), None);
        let panels = build_panels(&v, &layout(&v, WINDOW));
        assert!(panels
            .iter()
            .flat_map(|panel| panel.lines.iter())
            .any(|line| line.text == "Resident 7"));
        assert!(panels
            .iter()
            .flat_map(|panel| panel.lines.iter())
            .any(|line| line.text == "3 Punch"));
    }
}
