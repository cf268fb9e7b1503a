use engine::EntityId;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use super::stats::Stats;
use crate::content::{ActionText, DistrictDef, StatDelta, TalkDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Talk,
    Bribe,
    Punch,
}

impl Action {
    pub(crate) const ALL: [Action; 3] = [Action::Talk, Action::Bribe, Action::Punch];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Action::Talk => "Talk",
            Action::Bribe => "Bribe",
            Action::Punch => "Punch",
        }
    }
}

/// Selections made in the menu and message panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiEvent {
    Action(Action),
    CloseMenu,
    CloseMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InteractionTarget {
    pub entity: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InteractionRules {
    pub talk: TalkDef,
    pub bribe: ActionText,
    pub punch: ActionText,
    pub cooldown_seconds: f64,
    pub player_name: String,
}

impl InteractionRules {
    pub(crate) fn from_district(def: &DistrictDef) -> Self {
        Self {
            talk: def.talk.clone(),
            bribe: def.bribe.clone(),
            punch: def.punch.clone(),
            cooldown_seconds: f64::from(def.cooldown_seconds),
            player_name: def.player_name.clone(),
        }
    }

    pub(crate) fn format(&self, template: &str, npc_name: &str) -> String {
        template
            .replace("{npc}", npc_name)
            .replace("{player}", &self.player_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    MenuOpen(InteractionTarget),
}

/// Everything the interaction flow mutates. Times are seconds on the scene's
/// simulation clock.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameState {
    pub stats: Stats,
    phase: Phase,
    cooldown_deadline: Option<f64>,
    message: Option<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            stats: Stats::default(),
            phase: Phase::Idle,
            cooldown_deadline: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution {
    pub target: InteractionTarget,
    pub action: Action,
    pub delta: StatDelta,
    pub message: String,
}

impl Resolution {
    pub(crate) fn strikes_target(&self) -> bool {
        self.action == Action::Punch
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Transition {
    /// A guard rejected the event; nothing changed.
    Ignored,
    Resolved(Resolution),
    MenuClosed(InteractionTarget),
    MessageClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum InteractionError {
    #[error("{} selected with no interaction target", action.label())]
    NoTarget { action: Action },
}

#[derive(Debug, Clone)]
pub(crate) struct InteractionMachine {
    rules: InteractionRules,
    state: GameState,
}

impl InteractionMachine {
    pub(crate) fn new(rules: InteractionRules) -> Self {
        Self {
            rules,
            state: GameState::default(),
        }
    }

    pub(crate) fn rules(&self) -> &InteractionRules {
        &self.rules
    }

    pub(crate) fn state(&self) -> &GameState {
        &self.state
    }

    pub(crate) fn reset(&mut self) {
        self.state = GameState::default();
    }

    pub(crate) fn show_message(&mut self, text: String) {
        self.state.message = Some(text);
    }

    pub(crate) fn message(&self) -> Option<&str> {
        self.state.message.as_deref()
    }

    pub(crate) fn is_menu_open(&self) -> bool {
        matches!(self.state.phase, Phase::MenuOpen(_))
    }

    pub(crate) fn target(&self) -> Option<&InteractionTarget> {
        match &self.state.phase {
            Phase::MenuOpen(target) => Some(target),
            Phase::Idle => None,
        }
    }

    pub(crate) fn is_cooling_down(&self, now: f64) -> bool {
        self.state
            .cooldown_deadline
            .is_some_and(|deadline| now < deadline)
    }

    pub(crate) fn cooldown_remaining(&self, now: f64) -> f64 {
        self.state
            .cooldown_deadline
            .map_or(0.0, |deadline| (deadline - now).max(0.0))
    }

    /// Opens the menu for `target` unless it is already open or the cooldown
    /// is running. Opening hides any message.
    pub(crate) fn try_open(&mut self, target: InteractionTarget, now: f64) -> bool {
        if self.is_menu_open() || self.is_cooling_down(now) {
            return false;
        }
        self.state.phase = Phase::MenuOpen(target);
        self.state.message = None;
        true
    }

    pub(crate) fn handle(
        &mut self,
        event: UiEvent,
        now: f64,
        rng: &mut impl Rng,
    ) -> Result<Transition, InteractionError> {
        match event {
            UiEvent::Action(action) => {
                let Phase::MenuOpen(target) = std::mem::replace(&mut self.state.phase, Phase::Idle)
                else {
                    return Err(InteractionError::NoTarget { action });
                };
                let (delta, template) = match action {
                    Action::Talk => (
                        self.rules.talk.delta,
                        self.rules
                            .talk
                            .lines
                            .choose(rng)
                            .map(String::as_str)
                            .unwrap_or_default(),
                    ),
                    Action::Bribe => (self.rules.bribe.delta, self.rules.bribe.line.as_str()),
                    Action::Punch => (self.rules.punch.delta, self.rules.punch.line.as_str()),
                };
                let message = self.rules.format(template, &target.name);
                self.state.stats.apply(delta);
                self.state.message = Some(message.clone());
                self.start_cooldown(now);
                Ok(Transition::Resolved(Resolution {
                    target,
                    action,
                    delta,
                    message,
                }))
            }
            UiEvent::CloseMenu => match std::mem::replace(&mut self.state.phase, Phase::Idle) {
                Phase::MenuOpen(target) => {
                    self.start_cooldown(now);
                    Ok(Transition::MenuClosed(target))
                }
                Phase::Idle => Ok(Transition::Ignored),
            },
            UiEvent::CloseMessage => Ok(match self.state.message.take() {
                Some(_) => Transition::MessageClosed,
                None => Transition::Ignored,
            }),
        }
    }

    fn start_cooldown(&mut self, now: f64) {
        self.state.cooldown_deadline = Some(now + self.rules.cooldown_seconds);
    }
}
