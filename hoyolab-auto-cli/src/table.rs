//! Plain-text roster table printed before the redemption phase.

use std::collections::HashMap;

use hoyolab_auto_core::types::{Account, GameBinding};

/// Render one row per resolved (account, game, region) role:
/// HoYoLAB uid, game_biz, server, in-game uid and level, column-aligned.
pub fn render_bindings(roster: &[Account], bindings: &HashMap<u64, Vec<GameBinding>>) -> String {
    let mut rows: Vec<[String; 5]> = vec![[
        "HoYoLAB".to_string(),
        "Game".to_string(),
        "Server".to_string(),
        "UID".to_string(),
        "Lv".to_string(),
    ]];

    for account in roster {
        let Some(account_bindings) = bindings.get(&account.hoyolab_uid) else {
            continue;
        };
        for binding in account_bindings {
            for role in &binding.roles {
                rows.push([
                    account.hoyolab_uid.to_string(),
                    binding.game_biz.clone(),
                    role.region.clone(),
                    role.game_uid.clone(),
                    role.level.to_string(),
                ]);
            }
        }
    }

    let mut widths = [0usize; 5];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| {
                    // UID and level columns read better right-aligned.
                    if i >= 3 {
                        format!("{cell:>width$}", width = widths[i])
                    } else {
                        format!("{cell:<width$}", width = widths[i])
                    }
                })
                .collect::<Vec<String>>()
                .join(" ")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoyolab_auto_api::{Game, GameRole};
    use std::collections::BTreeMap;

    fn account(uid: u64) -> Account {
        Account {
            hoyolab_uid: uid,
            ltoken: "tok".into(),
            cookie_version: hoyolab_auto_api::CookieVersion::V2,
            display_name: format!("User {uid}"),
            discord_uid: None,
            lang: "ja-jp".into(),
            enabled_games: BTreeMap::new(),
        }
    }

    #[test]
    fn renders_one_row_per_role() {
        let mut binding = GameBinding::new(Game::Hk4e);
        binding.roles.push(GameRole {
            region: "os_asia".into(),
            game_uid: "800000001".into(),
            nickname: "Traveler".into(),
            level: 57,
        });
        binding.roles.push(GameRole {
            region: "os_euro".into(),
            game_uid: "700000001".into(),
            nickname: "Traveler".into(),
            level: 12,
        });
        let bindings = HashMap::from([(1, vec![binding])]);

        let table = render_bindings(&[account(1)], &bindings);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("HoYoLAB"));
        assert!(lines[1].contains("hk4e_global"));
        assert!(lines[1].contains("os_asia"));
        assert!(lines[2].contains("os_euro"));
    }

    #[test]
    fn accounts_without_bindings_render_header_only() {
        let table = render_bindings(&[account(1)], &HashMap::new());
        assert_eq!(table.lines().count(), 1);
    }
}
