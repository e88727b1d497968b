use crate::analysis::scoring::ChampionRow;
use crate::analysis::summary::{OverallMetrics, PeriodSummary, RankSnapshot, SplitSummary, YearSummary};
use crate::report::MatchPage;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ChampionLine {
    #[tabled(rename = "#")]
    rank: String,
    champion: String,
    role: String,
    games: String,
    win_rate: String,
    kda: String,
    #[tabled(rename = "cs/min")]
    cs_per_min: String,
    #[tabled(rename = "kp")]
    kill_participation: String,
    #[tabled(rename = "dmg%")]
    damage_share: String,
    score: String,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "#")]
    number: String,
    champion: String,
    result: String,
    kda: String,
    queue: String,
    patch: String,
    duration: String,
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn header(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message);
}

pub fn display_champion_table(rows: &[ChampionRow]) {
    if rows.is_empty() {
        println!("{}", "No champion data in this sample".yellow());
        return;
    }

    let lines: Vec<ChampionLine> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| ChampionLine {
            rank: format!("#{}", idx + 1),
            champion: row.name.clone(),
            role: row.role.to_string(),
            games: row.games.to_string(),
            win_rate: pct(row.win_rate),
            kda: format!("{:.2}", row.kda),
            cs_per_min: format!("{:.1}", row.cs_per_min),
            kill_participation: pct(row.kill_participation),
            damage_share: pct(row.damage_share),
            score: format!("{:.3}", row.score),
        })
        .collect();

    let mut table = Table::new(lines);
    table.with(Style::rounded());
    println!("{}", table);
}

fn display_overall(overall: &OverallMetrics) {
    let losses = overall.games - overall.wins;
    println!(
        "{} {} W / {} L ({} WR) as {}",
        "📈 Overall:".bold(),
        overall.wins.to_string().green(),
        losses.to_string().red(),
        pct(overall.win_rate),
        overall.primary_role
    );
    println!(
        "   KDA {:.2} · CS/min {:.1} · Vision/min {:.2} · KP {} · Damage {}",
        overall.kda,
        overall.cs_per_min,
        overall.vision_per_min,
        pct(overall.kill_participation),
        pct(overall.damage_share)
    );
}

pub fn display_period(title: &str, period: &PeriodSummary) {
    header(title);
    println!(
        "{} {} (confidence {:.2}, {} games analysed)",
        "🎮 Primary queue:".bold(),
        period.primary_queue.cyan(),
        period.queue_confidence,
        period.games_analyzed
    );

    let Some(overall) = &period.overall else {
        println!("{}", "No games for this player in this period".yellow());
        return;
    };
    display_overall(overall);

    match &period.best {
        Some(best) => {
            println!(
                "\n{} {} ({}) · {} games · {} WR · KDA {:.2}",
                "🏆 Best champion:".bold().green(),
                best.name.bold(),
                best.role,
                best.games,
                pct(best.win_rate),
                best.kda
            );
            if let Some(standout) = &period.standout {
                println!("   {} {:.2}", format!("{}:", standout.label).bold(), standout.value);
            }
        }
        None => println!("\n{}", "No champion has enough games to call a best pick".yellow()),
    }

    if !period.top_champions.is_empty() {
        println!("\n{}", "Also played".bold().yellow());
        for row in &period.top_champions {
            println!("  • {} ({}) · {} games · {} WR", row.name, row.role, row.games, pct(row.win_rate));
        }
    }

    if let Some(game) = &period.best_game {
        println!("\n{} {} on {}", "⭐ Best game:".bold(), game.score_line(), game.champion);
    }
    if let Some(game) = &period.fun_stat {
        println!(
            "{} {} deaths on {} ({}). We've all been there.",
            "💀 Most deaths game:".bold(),
            game.deaths,
            game.champion,
            game.score_line()
        );
    }
    println!();
}

pub fn display_split(summary: &SplitSummary) {
    let title = format!("📅 Split {} (patches {})", summary.split_id, summary.patch_range);
    display_period(&title, &summary.period);
}

pub fn display_year(summary: &YearSummary) {
    for split in &summary.splits {
        display_split(split);
    }
    display_period("📆 Year in review", &summary.year);
}

pub fn display_rank(player: &str, rank: &RankSnapshot) {
    header(&format!("🏅 Current rank for {}", player));
    match (&rank.tier, &rank.division) {
        (Some(tier), division) => {
            println!(
                "{} {} {} · {} LP ({})",
                "Rank:".bold(),
                tier.bold(),
                division.as_deref().unwrap_or(""),
                rank.lp,
                rank.queue
            );
            let games = rank.wins + rank.losses;
            let rate = if games > 0 { rank.wins as f64 / games as f64 } else { 0.0 };
            println!(
                "{} {} W / {} L ({})",
                "Record:".bold(),
                rank.wins.to_string().green(),
                rank.losses.to_string().red(),
                pct(rate)
            );
        }
        (None, _) => println!("{}", "Unranked".yellow()),
    }
    println!();
}

pub fn display_match_page(page: &MatchPage) {
    header(&format!("📊 MATCH HISTORY ({} games from #{})", page.matches.len(), page.start + 1));
    if page.matches.is_empty() {
        println!("{}", "No matches found".yellow());
        return;
    }

    let wins = page.matches.iter().filter(|m| m.win).count();
    println!(
        "{} {} W / {} L\n",
        "📈 Overall:".bold(),
        wins.to_string().green(),
        (page.matches.len() - wins).to_string().red()
    );

    let rows: Vec<MatchRow> = page
        .matches
        .iter()
        .enumerate()
        .map(|(idx, m)| MatchRow {
            number: format!("{}", page.start + idx + 1),
            champion: m.champion.clone(),
            result: if m.win {
                "WIN".green().to_string()
            } else {
                "LOSS".red().to_string()
            },
            kda: format!("{}/{}/{}", m.kills, m.deaths, m.assists),
            queue: if m.game_mode.is_empty() {
                m.queue_id.to_string()
            } else {
                format!("{} ({})", m.game_mode, m.queue_id)
            },
            patch: m.patch.clone(),
            duration: format!("{}:{:02}", m.duration_sec / 60, m.duration_sec % 60),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
    println!("Next page: --start {}", page.next_start);
}
