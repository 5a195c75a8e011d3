//! Resolver output: which shards an account actually plays.

use serde::{Deserialize, Serialize};

use hoyolab_auto_api::{Game, GameRole};

/// One account's presence in one game: the `game_biz` backend id plus every
/// regional role the account holds there. Rebuilt fresh each run, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameBinding {
    pub game: Game,
    pub game_biz: String,
    pub roles: Vec<GameRole>,
}

impl GameBinding {
    #[must_use]
    pub fn new(game: Game) -> Self {
        Self {
            game,
            game_biz: game.game_biz(),
            roles: Vec::new(),
        }
    }

    /// An account with no regional roles contributes no attempts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
