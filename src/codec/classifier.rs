//! Section headers and the running difficulty mode.
//!
//! A header line updates the mode for everything after it until the next header.
//! The tracker is a plain value owned by a single encode/decode/import call.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::Mode;

pub const MODE_EASY: &str = "__Mode: Easy__";
pub const MODE_NORMAL: &str = "__Mode: Normal__";
pub const MODE_HARD: &str = "__Mode: Hard__";
pub const BONUS: &str = "__Bonus__";
pub const MISC: &str = "__Misc__";

static SEASON_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^__(Winter|Spring|Summer|Fall)(?:\s+\d+)?__$").expect("valid season header regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn label(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }

    /// Classic requirement number the season's block starts at.
    pub fn first_number(self) -> u32 {
        match self {
            Season::Winter => 1,
            Season::Spring => 11,
            Season::Summer => 21,
            Season::Fall => 31,
        }
    }

    pub fn starting_at(number: u32) -> Option<Season> {
        Season::ALL.into_iter().find(|s| s.first_number() == number)
    }

    pub fn header(self, year: Option<&str>) -> String {
        match year {
            Some(y) => format!("__{} {}__", self.label(), y),
            None => format!("__{}__", self.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Easy,
    Normal,
    Hard,
    Bonus,
    Misc,
    Season(Season),
}

impl Section {
    pub fn mode(self) -> Mode {
        match self {
            Section::Easy => Mode::Easy,
            Section::Normal => Mode::Normal,
            Section::Hard => Mode::Hard,
            Section::Bonus => Mode::Bonus,
            Section::Misc | Section::Season(_) => Mode::Default,
        }
    }
}

/// Header for a mode section of a Genre challenge.
pub fn mode_header(mode: Mode) -> &'static str {
    match mode {
        Mode::Easy => MODE_EASY,
        Mode::Normal => MODE_NORMAL,
        Mode::Hard => MODE_HARD,
        Mode::Bonus => BONUS,
        Mode::Default => MISC,
    }
}

/// Recognize a header line. Checked in order Easy, Normal, Hard, Bonus, Misc, seasons.
pub fn classify(line: &str) -> Option<Section> {
    let line = line.trim();
    if line.starts_with(MODE_EASY) {
        Some(Section::Easy)
    } else if line.starts_with(MODE_NORMAL) {
        Some(Section::Normal)
    } else if line.starts_with(MODE_HARD) {
        Some(Section::Hard)
    } else if line.starts_with(BONUS) {
        Some(Section::Bonus)
    } else if line.starts_with(MISC) {
        Some(Section::Misc)
    } else {
        let caps = SEASON_HEADER.captures(line)?;
        let season = match &caps[1] {
            "Winter" => Season::Winter,
            "Spring" => Season::Spring,
            "Summer" => Season::Summer,
            _ => Season::Fall,
        };
        Some(Section::Season(season))
    }
}

/// Current mode while scanning one comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeTracker {
    current: Mode,
}

impl ModeTracker {
    pub fn current(&self) -> Mode {
        self.current
    }

    /// Consume `line` if it is a header. Returns true when it was one.
    pub fn observe(&mut self, line: &str) -> bool {
        match classify(line) {
            Some(section) => {
                self.current = section.mode();
                true
            }
            None => false,
        }
    }
}
