//! Domain models: challenges, their requirement definitions, per-user submissions,
//! and the transient requirement state the challenge code engine works with.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Host of the external anime catalog and forum.
pub const ANILIST_HOST: &str = "https://anilist.co";

/// Challenge category. Drives the section layout of a generated challenge code.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  #[default]
  Timed,
  Genre,
  Tier,
  Collection,
  Classic,
  Puzzle,
  Special,
}

/// Difficulty mode of a requirement.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  #[default]
  Default,
  Easy,
  Normal,
  Hard,
  Bonus,
}

/// Completion marker of a requirement line (`[X]`, `[O]`, `[U]`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
  #[default]
  NotCompleted,
  Completed,
  UpToDate,
}

impl Completion {
  pub fn marker(self) -> char {
    match self {
      Completion::NotCompleted => 'O',
      Completion::Completed => 'X',
      Completion::UpToDate => 'U',
    }
  }

  pub fn from_marker(marker: char) -> Option<Self> {
    match marker {
      'O' => Some(Completion::NotCompleted),
      'X' => Some(Completion::Completed),
      'U' => Some(Completion::UpToDate),
      _ => None,
    }
  }
}

/// Anime linked from a requirement line: `[title](https://anilist.co/anime/<id>/)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkedItem {
  pub title: String,
  pub link: String,
  pub id: u64,
}

impl LinkedItem {
  pub const PLACEHOLDER_TITLE: &'static str = "Anime Title";
  pub const PLACEHOLDER_LINK: &'static str = "https://anilist.co/anime/00000/";

  pub fn placeholder() -> Self {
    Self {
      title: Self::PLACEHOLDER_TITLE.into(),
      link: Self::PLACEHOLDER_LINK.into(),
      id: 0,
    }
  }

  /// Build from a title and a catalog link; `None` if the link has no numeric anime id.
  pub fn from_link(title: &str, link: &str) -> Option<Self> {
    let prefix = format!("{}/anime/", ANILIST_HOST);
    let digits: String = link
      .strip_prefix(&prefix)?
      .chars()
      .take_while(|c| c.is_ascii_digit())
      .collect();
    let id = digits.parse().ok()?;
    Some(Self { title: title.trim().into(), link: link.trim().into(), id })
  }

  pub fn is_placeholder(&self) -> bool {
    self.id == 0 || self.title == Self::PLACEHOLDER_TITLE
  }
}

/// Core challenge structure persisted by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: Uuid,
  pub name: String,
  pub thread_id: u64,
  pub category: Category,
  #[serde(default)] pub extra: String,
  /// Prerequisite challenge ids, in the order they were added.
  #[serde(default)] pub prerequisites: Vec<Uuid>,
  #[serde(default)] pub allows_up_to_date: bool,
  #[serde(default)] pub archived: bool,
}

impl Challenge {
  pub fn new(name: impl Into<String>, thread_id: u64, category: Category) -> Self {
    Self {
      id: Uuid::new_v4(),
      name: name.into(),
      thread_id,
      category,
      extra: String::new(),
      prerequisites: Vec::new(),
      allows_up_to_date: false,
      archived: false,
    }
  }
}

/// Requirement definition row. Numbers are unique per (challenge, bonus).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Requirement {
  pub challenge_id: Uuid,
  pub number: u32,
  pub mode: Mode,
  pub text: String,
  pub bonus: bool,
  #[serde(default)] pub extra: String,
  /// Extra starts on its own line instead of trailing the anime link.
  #[serde(default)] pub extra_newline: bool,
  /// Fixed anime; wins over whatever a comment links.
  #[serde(default)] pub linked_item: Option<LinkedItem>,
  /// Line(s) that cannot be re-derived and are passed through verbatim.
  #[serde(default)] pub force_raw_edit: bool,
  #[serde(default)] pub raw_requirement: Option<String>,
}

impl Requirement {
  pub fn new(challenge_id: Uuid, number: u32, mode: Mode, bonus: bool) -> Self {
    Self {
      challenge_id,
      number,
      mode,
      text: String::new(),
      bonus,
      extra: String::new(),
      extra_newline: false,
      linked_item: None,
      force_raw_edit: false,
      raw_requirement: None,
    }
  }
}

/// Lookup key of a requirement inside its challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequirementKey {
  pub number: u32,
  pub bonus: bool,
}

/// Structured progress of one requirement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tracked {
  pub completed: Completion,
  pub start: String,
  pub finish: String,
  pub anime: LinkedItem,
  pub extra: String,
}

/// Either fully structured fields or the verbatim raw line(s), never both.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Progress {
  Tracked(Tracked),
  Raw { raw_requirement: String },
}

/// One requirement as read from (or written to) a user's challenge code.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RequirementState {
  pub mode: Mode,
  /// Zero-padded to two digits (`"01"`).
  pub number: String,
  pub bonus: bool,
  pub progress: Progress,
}

impl RequirementState {
  pub fn key(&self) -> Option<RequirementKey> {
    let number = self.number.parse().ok()?;
    Some(RequirementKey { number, bonus: self.bonus })
  }

  pub fn tracked(&self) -> Option<&Tracked> {
    match &self.progress {
      Progress::Tracked(t) => Some(t),
      Progress::Raw { .. } => None,
    }
  }
}

pub fn padded_number(number: u32) -> String {
  format!("{:02}", number)
}

/// Thread/comment pair locating a forum comment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentLocator {
  pub thread_id: u64,
  pub comment_id: u64,
}

impl CommentLocator {
  pub fn url(&self) -> String {
    format!("{}/forum/thread/{}/comment/{}", ANILIST_HOST, self.thread_id, self.comment_id)
  }
}

/// A user's registration for a challenge and where its challenge code lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
  pub id: Uuid,
  pub user: String,
  pub challenge_id: Uuid,
  pub thread_id: u64,
  pub comment_id: u64,
  /// Comment announcing the finished challenge, once posted.
  #[serde(default)] pub announcement_comment_id: Option<u64>,
}

impl Submission {
  pub fn locator(&self) -> CommentLocator {
    CommentLocator { thread_id: self.thread_id, comment_id: self.comment_id }
  }
}
