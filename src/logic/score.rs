//! Tennis score strings: games won per side and format inference.

use crate::models::MatchFormat;

/// Highest game count accepted in one set (covers long match tiebreaks).
const MAX_GAMES_PER_SET: u32 = 50;
const MAX_SETS: usize = 5;

/// Totals from a parsed score, from the winner's point of view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParsedScore {
    pub winner_games: u32,
    pub loser_games: u32,
    pub sets: usize,
}

/// Parse `"6-4 3-6 7-6(5)"` style scores. Sets may be separated by spaces or
/// commas and written `a-b`, `a/b` or `a:b`; tiebreak points in parentheses
/// are ignored. Totals are oriented so the side that won more sets comes
/// first. Returns None if any set is malformed.
pub fn parse_score(score: &str) -> Option<ParsedScore> {
    let sets: Vec<&str> = score
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
        .collect();
    if sets.is_empty() || sets.len() > MAX_SETS {
        return None;
    }

    let mut parsed = ParsedScore {
        winner_games: 0,
        loser_games: 0,
        sets: sets.len(),
    };
    let mut first_side_sets = 0;
    for set in sets {
        let (a, b) = parse_set(set)?;
        parsed.winner_games += a;
        parsed.loser_games += b;
        if a > b {
            first_side_sets += 1;
        }
    }
    // Written from the loser's side: the second column won more sets.
    if first_side_sets * 2 < parsed.sets {
        std::mem::swap(&mut parsed.winner_games, &mut parsed.loser_games);
    }
    Some(parsed)
}

fn parse_set(set: &str) -> Option<(u32, u32)> {
    let games = match set.find('(') {
        Some(idx) if set.ends_with(')') => &set[..idx],
        Some(_) => return None,
        None => set,
    };
    let mut parts = games.split(['-', '/', ':']);
    let w: u32 = parts.next()?.trim().parse().ok()?;
    let l: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || w == l || w > MAX_GAMES_PER_SET || l > MAX_GAMES_PER_SET {
        return None;
    }
    Some((w, l))
}

/// Format implied by the number of sets. Unparseable scores count as standard.
pub fn infer_format(score: Option<&ParsedScore>) -> MatchFormat {
    match score.map(|s| s.sets) {
        Some(1) => MatchFormat::Short,
        Some(4..) => MatchFormat::Long,
        _ => MatchFormat::Standard,
    }
}
