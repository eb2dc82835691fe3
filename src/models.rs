use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, SubmitError};
use crate::utils::{parse_kills, parse_placement};

pub const MAP_COUNT: u8 = 15;
pub const MAX_PLACEMENT: u8 = 20;
pub const PLAYERS_PER_TEAM: usize = 3;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MapNumber(u8);

impl MapNumber {
    pub fn new(n: u8) -> Option<Self> {
        (1..=MAP_COUNT).contains(&n).then_some(MapNumber(n))
    }

    pub fn all() -> impl Iterator<Item = MapNumber> {
        (1..=MAP_COUNT).map(MapNumber)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("Map {}", self.0)
    }

    /// Parses the `#map-N` fragment used to keep the selection in the URL.
    pub fn from_hash(hash: &str) -> Option<Self> {
        let n = hash.trim_start_matches('#').strip_prefix("map-")?;
        n.parse::<u8>().ok().and_then(MapNumber::new)
    }

    pub fn to_hash(self) -> String {
        format!("#map-{}", self.0)
    }
}

impl Default for MapNumber {
    fn default() -> Self {
        MapNumber(1)
    }
}

impl fmt::Display for MapNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Placement(u8);

impl Placement {
    pub fn new(n: u8) -> Option<Self> {
        (1..=MAX_PLACEMENT).contains(&n).then_some(Placement(n))
    }

    pub fn all() -> impl Iterator<Item = Placement> {
        (1..=MAX_PLACEMENT).map(Placement)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        let suffix = match (self.0 % 10, self.0 % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        format!("{}{}", self.0, suffix)
    }
}

/// A scoreboard screenshot as read from the file picker or the clipboard.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenshotImage {
    pub name: String,
    pub mime: String,
    pub bytes: Rc<Vec<u8>>,
}

impl ScreenshotImage {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: Rc::new(bytes),
        }
    }

    pub fn preview_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(self.bytes.as_slice()))
    }

    pub fn size_kb(&self) -> usize {
        self.bytes.len().div_ceil(1024)
    }
}

/// Row written to the submissions table once per submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoreSubmission {
    pub team_id: String,
    pub map_number: MapNumber,
    pub player1_kills: u32,
    pub player2_kills: u32,
    pub player3_kills: u32,
    pub placement: Placement,
    pub scoreboard_image_url: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormState {
    pub placement: String,
    pub kills: [String; PLAYERS_PER_TEAM],
    pub image: Option<ScreenshotImage>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedSubmission {
    pub team_id: String,
    pub map: MapNumber,
    pub kills: [u32; PLAYERS_PER_TEAM],
    pub placement: Placement,
    pub image: ScreenshotImage,
}

impl FormState {
    pub fn validate(&self, team_id: &str, map: MapNumber) -> Result<ValidatedSubmission> {
        let team_id = team_id.trim();
        if team_id.is_empty() {
            return Err(SubmitError::validation("Team", "is not set"));
        }
        let image = self.image.clone().ok_or(SubmitError::MissingImage)?;

        let mut kills = [0u32; PLAYERS_PER_TEAM];
        for (slot, raw) in self.kills.iter().enumerate() {
            kills[slot] = parse_kills(raw)
                .map_err(|e| SubmitError::validation(format!("Player {} kills", slot + 1), e))?;
        }
        let placement =
            parse_placement(&self.placement).map_err(|e| SubmitError::validation("Placement", e))?;

        Ok(ValidatedSubmission {
            team_id: team_id.to_string(),
            map,
            kills,
            placement,
            image,
        })
    }
}

impl ValidatedSubmission {
    pub fn into_record(self, scoreboard_image_url: String) -> ScoreSubmission {
        let [player1_kills, player2_kills, player3_kills] = self.kills;
        ScoreSubmission {
            team_id: self.team_id,
            map_number: self.map,
            player1_kills,
            player2_kills,
            player3_kills,
            placement: self.placement,
            scoreboard_image_url,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub enum NoticeKind {
    #[default]
    Error,
    Success,
    Info,
}

impl NoticeKind {
    pub fn class(&self) -> &'static str {
        match self {
            NoticeKind::Error => "notice-error",
            NoticeKind::Success => "notice-success",
            NoticeKind::Info => "notice-info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> FormState {
        FormState {
            placement: "3".into(),
            kills: ["4".into(), " 0 ".into(), "12".into()],
            image: Some(ScreenshotImage::new("shot.png", "image/png", vec![1, 2, 3])),
        }
    }

    #[test]
    fn map_numbers_cover_one_through_fifteen() {
        let maps: Vec<u8> = MapNumber::all().map(MapNumber::get).collect();
        assert_eq!(maps, (1..=15).collect::<Vec<_>>());
        assert!(MapNumber::new(0).is_none());
        assert!(MapNumber::new(16).is_none());
        assert_eq!(MapNumber::default().get(), 1);
    }

    #[test]
    fn map_hash_parsing() {
        assert_eq!(MapNumber::from_hash("#map-7"), MapNumber::new(7));
        assert_eq!(MapNumber::from_hash("map-15"), MapNumber::new(15));
        assert_eq!(MapNumber::from_hash("#map-16"), None);
        assert_eq!(MapNumber::from_hash("#maps"), None);
        assert_eq!(MapNumber::from_hash(""), None);
        assert_eq!(MapNumber::new(4).map(MapNumber::to_hash).as_deref(), Some("#map-4"));
    }

    #[test]
    fn placement_labels() {
        let labels: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 20]
            .into_iter()
            .filter_map(Placement::new)
            .map(Placement::label)
            .collect();
        assert_eq!(labels, ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "20th"]);
        assert_eq!(Placement::all().count(), MAX_PLACEMENT as usize);
    }

    #[test]
    fn preview_url_is_a_data_url() {
        let img = ScreenshotImage::new("a.png", "image/png", b"abc".to_vec());
        assert_eq!(img.preview_url(), "data:image/png;base64,YWJj");
        assert_eq!(img.size_kb(), 1);
    }

    #[test]
    fn validate_builds_the_outbound_record() {
        let map = MapNumber::new(5).unwrap();
        let validated = filled_form().validate(" team-9 ", map).unwrap();
        let record = validated.into_record("https://cdn/x.jpg".into());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "team_id": "team-9",
                "map_number": 5,
                "player1_kills": 4,
                "player2_kills": 0,
                "player3_kills": 12,
                "placement": 3,
                "scoreboard_image_url": "https://cdn/x.jpg"
            })
        );
    }

    #[test]
    fn validate_requires_an_image() {
        let form = FormState { image: None, ..filled_form() };
        let err = form.validate("team", MapNumber::default()).unwrap_err();
        assert!(matches!(err, SubmitError::MissingImage));
    }

    #[test]
    fn validate_reports_the_offending_player() {
        let mut form = filled_form();
        form.kills[1] = "two".into();
        let err = form.validate("team", MapNumber::default()).unwrap_err();
        assert!(err.to_string().starts_with("Player 2 kills"), "{err}");
    }

    #[test]
    fn validate_rejects_missing_team_and_placement() {
        let err = filled_form().validate("  ", MapNumber::default()).unwrap_err();
        assert_eq!(err.to_string(), "Team is not set");

        let form = FormState { placement: String::new(), ..filled_form() };
        let err = form.validate("team", MapNumber::default()).unwrap_err();
        assert!(err.to_string().starts_with("Placement"), "{err}");
    }

    #[test]
    fn default_form_is_empty() {
        let form = FormState::default();
        assert!(form.image.is_none());
        assert!(form.kills.iter().all(String::is_empty));
        assert!(form.placement.is_empty());
    }
}
