use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LevelTableError, TransitionRejected};
use crate::scores::round_to;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub index: usize,
    pub name: String,
    /// Points needed to complete this level. `None` marks the terminal level.
    pub cumulative_points_required: Option<u32>,
    pub daily_points_for_privileges: u32,
}

impl LevelDefinition {
    pub fn new(index: usize, name: &str, required: Option<u32>, daily_privileges: u32) -> Self {
        Self {
            index,
            name: name.to_string(),
            cumulative_points_required: required,
            daily_points_for_privileges: daily_privileges,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.cumulative_points_required.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YouthLevelState {
    /// Signed so stale stored values survive; the engine clamps them to 0.
    pub level_index: i64,
    pub points_in_current_level: u32,
}

impl YouthLevelState {
    pub fn new(level_index: i64, points_in_current_level: u32) -> Self {
        Self {
            level_index,
            points_in_current_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: LevelDefinition,
    pub next_level: Option<LevelDefinition>,
    pub points: u32,
    pub required: Option<u32>,
    pub remaining: Option<u32>,
    pub percent_complete: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl LevelTable {
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self, LevelTableError> {
        if levels.is_empty() {
            return Err(LevelTableError::Empty);
        }

        let last = levels.len() - 1;
        let mut previous = 0u32;
        for (position, level) in levels.iter().enumerate() {
            if level.index != position {
                return Err(LevelTableError::NonContiguousIndex {
                    position,
                    found: level.index,
                });
            }

            match level.cumulative_points_required {
                Some(_) if position == last => return Err(LevelTableError::MissingTerminal),
                Some(required) => {
                    if required < previous {
                        return Err(LevelTableError::DecreasingRequirement {
                            index: position,
                            required,
                            previous,
                        });
                    }
                    previous = required;
                }
                None if position != last => {
                    return Err(LevelTableError::UnboundedBeforeEnd { index: position });
                }
                None => {}
            }
        }

        Ok(Self { levels })
    }

    pub fn from_json(raw: &str) -> Result<Self, LevelTableError> {
        let levels: Vec<LevelDefinition> =
            serde_json::from_str(raw).map_err(|err| LevelTableError::Parse(err.to_string()))?;
        Self::new(levels)
    }

    pub fn standard() -> Self {
        Self {
            levels: vec![
                LevelDefinition::new(0, "Orientation", Some(120), 10),
                LevelDefinition::new(1, "Level 1", Some(840), 20),
                LevelDefinition::new(2, "Level 2", Some(1_260), 25),
                LevelDefinition::new(3, "Level 3", Some(1_680), 30),
                LevelDefinition::new(4, "Level 4", None, 35),
            ],
        }
    }

    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn terminal_index(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&LevelDefinition> {
        self.levels.get(index)
    }

    pub fn contains_index(&self, state: &YouthLevelState) -> bool {
        usize::try_from(state.level_index).map_or(false, |index| index < self.levels.len())
    }

    pub fn effective_index(&self, state: &YouthLevelState) -> usize {
        match usize::try_from(state.level_index) {
            Ok(index) if index < self.levels.len() => index,
            _ => {
                debug!(
                    level_index = state.level_index,
                    levels = self.levels.len(),
                    "level index outside ladder, clamping to first level"
                );
                0
            }
        }
    }

    pub fn current_level(&self, state: &YouthLevelState) -> &LevelDefinition {
        &self.levels[self.effective_index(state)]
    }

    pub fn next_level(&self, state: &YouthLevelState) -> Option<&LevelDefinition> {
        self.levels.get(self.effective_index(state) + 1)
    }

    pub fn meets_privilege_requirement(
        &self,
        state: &YouthLevelState,
        daily_points_earned_today: u32,
    ) -> bool {
        daily_points_earned_today >= self.current_level(state).daily_points_for_privileges
    }

    pub fn can_level_up(&self, state: &YouthLevelState) -> bool {
        let index = self.effective_index(state);
        if index >= self.terminal_index() {
            return false;
        }

        match self.levels[index].cumulative_points_required {
            Some(required) => state.points_in_current_level >= required,
            None => false,
        }
    }

    pub fn apply_level_up(
        &self,
        state: &YouthLevelState,
    ) -> Result<YouthLevelState, TransitionRejected> {
        let index = self.effective_index(state);
        let required = match self.levels[index].cumulative_points_required {
            Some(required) if index < self.terminal_index() => required,
            _ => return Err(TransitionRejected::AtTerminalLevel { level_index: index }),
        };

        if state.points_in_current_level < required {
            return Err(TransitionRejected::NotEligible {
                level_index: index,
                points: state.points_in_current_level,
                required,
            });
        }

        let next = YouthLevelState {
            level_index: index as i64 + 1,
            points_in_current_level: state.points_in_current_level - required,
        };
        debug!(
            from = index,
            to = next.level_index,
            carried = next.points_in_current_level,
            "level up"
        );
        Ok(next)
    }

    pub fn apply_level_demotion(
        &self,
        state: &YouthLevelState,
    ) -> Result<YouthLevelState, TransitionRejected> {
        let index = self.effective_index(state);
        if index == 0 {
            return Err(TransitionRejected::AtFloor);
        }

        debug!(from = index, to = index - 1, "level demotion");
        Ok(YouthLevelState {
            level_index: index as i64 - 1,
            points_in_current_level: 0,
        })
    }

    pub fn award_points(&self, state: &YouthLevelState, points: u32) -> YouthLevelState {
        YouthLevelState {
            level_index: state.level_index,
            points_in_current_level: state.points_in_current_level.saturating_add(points),
        }
    }

    pub fn progress(&self, state: &YouthLevelState) -> LevelProgress {
        let level = self.current_level(state).clone();
        let next_level = self.next_level(state).cloned();
        let points = state.points_in_current_level;
        let required = level.cumulative_points_required;

        let remaining = required.map(|required| required.saturating_sub(points));
        let percent_complete = required.map(|required| {
            if required == 0 {
                100.0
            } else {
                let ratio = points as f64 / required as f64 * 100.0;
                round_to(ratio.min(100.0), 1)
            }
        });

        LevelProgress {
            level,
            next_level,
            points,
            required,
            remaining,
            percent_complete,
        }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}
