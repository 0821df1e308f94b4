use std::collections::HashMap;

use serde::Serialize;

/// The host connection for a room. Set once, cleared only by room deletion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub name: String,
    pub joined_at: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    /// Team token parsed from the display name at admission time
    pub team: Option<String>,
    pub joined_at: u64,
    pub buzzed: bool,
}

/// One entry in the ranked buzz log. Position in the log is the rank;
/// `diff` is milliseconds behind the first buzz of the round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuzzEntry {
    pub participant_id: String,
    pub participant_name: String,
    pub timestamp: u64,
    pub diff: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub name: String,
    pub score: u32,
    pub member_count: usize,
}

/// Room state snapshot sent to clients after every mutation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub host_id: Option<String>,
    pub participant_count: usize,
    pub buzzer_locked: bool,
    pub buzzes: Vec<BuzzEntry>,
    pub teams: Vec<TeamStanding>,
}

/// Result of recording a buzz. A repeated buzz in the same round is a
/// harmless no-op, not an error.
#[derive(Debug, Clone)]
pub enum BuzzOutcome {
    Recorded {
        buzzes: Vec<BuzzEntry>,
    },
    AlreadyBuzzed {
        buzzes: Vec<BuzzEntry>,
    },
}

/// One quiz session: membership, round state, buzz log, and team scores.
/// Policy (id generation, admission rules, broadcast) lives in the manager.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub host: Option<Host>,
    pub participants: HashMap<String, Participant>,
    /// Reserved single-winner flag. Cleared on round reset, never set:
    /// the server accepts the full ranked sequence each round.
    pub buzzer_locked: bool,
    pub buzzes: Vec<BuzzEntry>,
    /// Uppercase team name -> score. Survives round resets.
    pub team_scores: HashMap<String, u32>,
    pub created_at: u64,
    pub last_activity: u64,
}

impl Room {
    pub fn new(id: String, now: u64) -> Self {
        Self {
            id,
            host: None,
            participants: HashMap::new(),
            buzzer_locked: false,
            buzzes: Vec::new(),
            team_scores: HashMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_idle(&self, now: u64, timeout_millis: u64) -> bool {
        now.saturating_sub(self.last_activity) > timeout_millis
    }

    pub fn touch(&mut self, now: u64) {
        self.last_activity = now;
    }

    /// Starts a fresh buzz-collection window. Team scores persist.
    pub fn reset_round(&mut self, now: u64) {
        self.buzzer_locked = false;
        self.buzzes.clear();
        for participant in self.participants.values_mut() {
            participant.buzzed = false;
        }
        self.touch(now);
    }

    /// Appends a server-stamped buzz for the participant, or reports that
    /// they already buzzed this round without touching any state.
    pub fn record_buzz(&mut self, participant_id: &str, now: u64) -> Option<BuzzOutcome> {
        let participant = self.participants.get_mut(participant_id)?;

        if participant.buzzed {
            return Some(BuzzOutcome::AlreadyBuzzed {
                buzzes: self.buzzes.clone(),
            });
        }

        participant.buzzed = true;
        let participant_name = participant.name.clone();

        self.buzzes.push(BuzzEntry {
            participant_id: participant_id.to_string(),
            participant_name,
            timestamp: now,
            diff: 0,
        });

        // Re-anchor every diff on the first entry so buzzes[0].diff == 0
        // holds no matter how the log got here
        let first = self.buzzes[0].timestamp;
        for buzz in &mut self.buzzes {
            buzz.diff = buzz.timestamp.saturating_sub(first);
        }

        self.touch(now);
        Some(BuzzOutcome::Recorded {
            buzzes: self.buzzes.clone(),
        })
    }

    pub fn award_point(&mut self, team: &str, now: u64) -> u32 {
        let score = self.team_scores.entry(team.to_uppercase()).or_insert(0);
        *score += 1;
        let score = *score;
        self.touch(now);
        score
    }

    /// Removes a point from the team, flooring at zero
    pub fn deduct_point(&mut self, team: &str, now: u64) -> u32 {
        let score = self.team_scores.entry(team.to_uppercase()).or_insert(0);
        *score = score.saturating_sub(1);
        let score = *score;
        self.touch(now);
        score
    }

    /// Current leaderboard: every team with a present member or a stored
    /// score. A team whose members all left still appears with
    /// member_count 0. No fixed order; the UI sorts as needed.
    pub fn team_standings(&self) -> Vec<TeamStanding> {
        let mut standings: HashMap<String, TeamStanding> = HashMap::new();

        for participant in self.participants.values() {
            if let Some(team) = &participant.team {
                let entry = standings.entry(team.clone()).or_insert_with(|| TeamStanding {
                    name: team.clone(),
                    score: 0,
                    member_count: 0,
                });
                entry.member_count += 1;
            }
        }

        for (team, score) in &self.team_scores {
            let entry = standings.entry(team.clone()).or_insert_with(|| TeamStanding {
                name: team.clone(),
                score: 0,
                member_count: 0,
            });
            entry.score = *score;
        }

        standings.into_values().collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            host_id: self.host.as_ref().map(|h| h.id.clone()),
            participant_count: self.participants.len(),
            buzzer_locked: self.buzzer_locked,
            buzzes: self.buzzes.clone(),
            teams: self.team_standings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_participants(names: &[(&str, &str)]) -> Room {
        let mut room = Room::new("r1".to_string(), 1_000);
        for (id, raw) in names {
            let parsed = crate::rooms::parse_display_name(raw);
            room.participants.insert(
                id.to_string(),
                Participant {
                    id: id.to_string(),
                    name: parsed.display,
                    team: parsed.team,
                    joined_at: 1_000,
                    buzzed: false,
                },
            );
        }
        room
    }

    #[test]
    fn test_buzz_diffs_anchor_on_first_entry() {
        let mut room = room_with_participants(&[("p1", "Bob (teamx)"), ("p2", "Cara (teamx)")]);

        room.record_buzz("p1", 5_000).unwrap();
        room.record_buzz("p2", 5_250).unwrap();

        assert_eq!(room.buzzes.len(), 2);
        assert_eq!(room.buzzes[0].diff, 0);
        assert_eq!(room.buzzes[1].diff, 250);
        assert_eq!(room.buzzes[0].participant_id, "p1");
    }

    #[test]
    fn test_second_buzz_from_same_participant_is_a_no_op() {
        let mut room = room_with_participants(&[("p1", "Bob (teamx)")]);

        room.record_buzz("p1", 5_000).unwrap();
        let outcome = room.record_buzz("p1", 6_000).unwrap();

        assert!(matches!(outcome, BuzzOutcome::AlreadyBuzzed { .. }));
        assert_eq!(room.buzzes.len(), 1);
        assert_eq!(room.buzzes[0].timestamp, 5_000);
    }

    #[test]
    fn test_unknown_participant_cannot_buzz() {
        let mut room = room_with_participants(&[("p1", "Bob (teamx)")]);
        assert!(room.record_buzz("ghost", 5_000).is_none());
        assert!(room.buzzes.is_empty());
    }

    #[test]
    fn test_reset_round_clears_buzzes_but_not_scores() {
        let mut room = room_with_participants(&[("p1", "Bob (teamx)")]);
        room.award_point("TEAMX", 2_000);
        room.record_buzz("p1", 5_000).unwrap();

        room.reset_round(6_000);

        assert!(room.buzzes.is_empty());
        assert!(!room.buzzer_locked);
        assert!(!room.participants["p1"].buzzed);
        assert_eq!(room.team_scores["TEAMX"], 1);
    }

    #[test]
    fn test_deduct_point_floors_at_zero() {
        let mut room = room_with_participants(&[]);
        assert_eq!(room.deduct_point("TEAMX", 2_000), 0);
        room.award_point("TEAMX", 2_100);
        room.award_point("TEAMX", 2_200);
        assert_eq!(room.deduct_point("TEAMX", 2_300), 1);
    }

    #[test]
    fn test_standings_include_vacated_teams() {
        let mut room = room_with_participants(&[("p1", "Bob (teamx)"), ("p2", "Cara (teamx)")]);
        room.award_point("OLD", 2_000);

        let standings = room.team_standings();
        assert_eq!(standings.len(), 2);

        let teamx = standings.iter().find(|t| t.name == "TEAMX").unwrap();
        assert_eq!(teamx.member_count, 2);
        assert_eq!(teamx.score, 0);

        let old = standings.iter().find(|t| t.name == "OLD").unwrap();
        assert_eq!(old.member_count, 0);
        assert_eq!(old.score, 1);
    }

    #[test]
    fn test_is_idle_respects_timeout() {
        let mut room = Room::new("r1".to_string(), 1_000);
        assert!(!room.is_idle(1_500, 600));
        assert!(room.is_idle(1_601, 600));
        room.touch(2_000);
        assert!(!room.is_idle(2_500, 600));
    }
}
