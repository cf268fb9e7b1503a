use crate::content::StatDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KarmaBand {
    Virtuous,
    Neutral,
    Notorious,
}

impl KarmaBand {
    /// Strictly above `threshold` is virtuous, strictly below `-threshold`
    /// notorious.
    pub(crate) fn from_karma(karma: i32, threshold: i32) -> Self {
        if karma > threshold {
            KarmaBand::Virtuous
        } else if karma < threshold.saturating_neg() {
            KarmaBand::Notorious
        } else {
            KarmaBand::Neutral
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            KarmaBand::Virtuous => "virtuous",
            KarmaBand::Neutral => "neutral",
            KarmaBand::Notorious => "notorious",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Stats {
    pub influence: u32,
    pub karma: i32,
}

impl Stats {
    /// Influence never drops below zero.
    pub(crate) fn apply(&mut self, delta: StatDelta) {
        self.influence = self.influence.saturating_add_signed(delta.influence);
        self.karma = self.karma.saturating_add(delta.karma);
    }

    pub(crate) fn karma_band(&self, threshold: i32) -> KarmaBand {
        KarmaBand::from_karma(self.karma, threshold)
    }
}
