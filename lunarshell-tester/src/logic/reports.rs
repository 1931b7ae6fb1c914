use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::simulation::{SimulationAggregate, SimulationRecord};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    records: &'a [SimulationRecord],
    aggregates: &'a [SimulationAggregate],
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    aggregates: &[SimulationAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Exploration Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=================================".cyan())?;

    let total_runs = records.len();
    let passed_runs = records.iter().filter(|r| r.passed()).count();
    writeln!(out, "Total runs: {total_runs}")?;
    writeln!(out, "Passed: {}", passed_runs.to_string().green())?;
    writeln!(out, "Failed: {}", (total_runs - passed_runs).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in records {
        let status = if record.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} seed {}",
            status,
            record.strategy.label().bold(),
            record.seed
        )?;
        writeln!(
            out,
            "   Entries: {} generated, {} kept | Choices: {} | Buildings: {}",
            record.entries_generated,
            record.history_len,
            record.choices_resolved,
            record.buildings_found
        )?;
        writeln!(
            out,
            "   Fights: {} ({} won) | Moonlight: {} | HP: {}/{} | Difficulty: {}",
            record.fights,
            record.victories,
            record.moonlight.to_string().yellow(),
            record.hp,
            record.max_hp,
            record.final_difficulty
        )?;
        for violation in &record.violations {
            writeln!(out, "     • {}", violation.red())?;
        }
    }

    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "📈 Strategy Aggregates".bright_yellow().bold())?;
        writeln!(out, "{}", "======================".yellow())?;
        for agg in aggregates {
            writeln!(
                out,
                "{:<9} runs {:>3} | entries {:>6.1} | moonlight {:>8.1} ± {:<7.1} | fights {:>5.1} | wins {:>5.1}% | difficulty {:>4.1}",
                agg.strategy.label(),
                agg.runs,
                agg.mean_entries,
                agg.mean_moonlight,
                agg.std_moonlight,
                agg.mean_fights,
                agg.victory_pct,
                agg.mean_final_difficulty
            )?;
            if agg.failed_runs > 0 {
                writeln!(
                    out,
                    "          {}",
                    format!("{} run(s) violated invariants", agg.failed_runs).red()
                )?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    aggregates: &[SimulationAggregate],
) -> Result<()> {
    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        records,
        aggregates,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    aggregates: &[SimulationAggregate],
) -> Result<()> {
    writeln!(out, "# Lunar Shell Exploration Simulation\n")?;

    let total_runs = records.len();
    let passed_runs = records.iter().filter(|r| r.passed()).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total_runs}")?;
    writeln!(out, "- **Passed**: {passed_runs}")?;
    writeln!(out, "- **Failed**: {}\n", total_runs - passed_runs)?;

    writeln!(out, "## Strategies\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Mean entries | Mean moonlight | Std moonlight | Mean fights | Win % | Mean difficulty |"
    )?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|")?;
    for agg in aggregates {
        writeln!(
            out,
            "| {} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} | {:.1} |",
            agg.strategy.label(),
            agg.runs,
            agg.mean_entries,
            agg.mean_moonlight,
            agg.std_moonlight,
            agg.mean_fights,
            agg.victory_pct,
            agg.mean_final_difficulty
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Runs\n")?;
    for record in records {
        let status = if record.passed() { "✅" } else { "❌" };
        writeln!(out, "### {} {} seed {}\n", status, record.strategy.label(), record.seed)?;
        writeln!(out, "- **Entries**: {}", record.entries_generated)?;
        writeln!(out, "- **Choices resolved**: {}", record.choices_resolved)?;
        writeln!(out, "- **Fights**: {} ({} won)", record.fights, record.victories)?;
        writeln!(out, "- **Moonlight**: {}", record.moonlight)?;
        if !record.violations.is_empty() {
            writeln!(out, "- **Violations**:")?;
            for violation in &record.violations {
                writeln!(out, "  - {violation}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::ExplorationStrategy;
    use crate::logic::simulation::aggregate_records;
    use std::collections::BTreeMap;

    fn record(seed: u64, violations: Vec<String>) -> SimulationRecord {
        SimulationRecord {
            seed,
            strategy: ExplorationStrategy::Greedy,
            minutes: 1,
            entries_generated: 9,
            history_len: 9,
            kind_counts: BTreeMap::new(),
            choices_resolved: 1,
            fights: 1,
            victories: 1,
            buildings_found: 0,
            moonlight: 140,
            resources: BTreeMap::new(),
            hp: 90,
            max_hp: 100,
            final_difficulty: 1,
            rng_draws: lunarshell_game::StreamDraws::default(),
            violations,
        }
    }

    #[test]
    fn json_report_carries_records_and_aggregates() {
        let records = vec![record(1, Vec::new()), record(2, vec!["negative moonlight -1".into()])];
        let aggregates = aggregate_records(&records);
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &records, &aggregates).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
        assert_eq!(value["aggregates"][0]["strategy"], "greedy");
        assert_eq!(value["aggregates"][0]["failed_runs"], 1);
    }

    #[test]
    fn markdown_report_lists_violations() {
        let records = vec![record(3, vec!["hp 120 outside 0..=100".into()])];
        let aggregates = aggregate_records(&records);
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &records, &aggregates).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("# Lunar Shell Exploration Simulation"));
        assert!(text.contains("| Greedy | 1 |"));
        assert!(text.contains("  - hp 120 outside 0..=100"));
    }

    #[test]
    fn console_report_counts_passes() {
        colored::control::set_override(false);
        let records = vec![record(4, Vec::new())];
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &records, &aggregate_records(&records), Duration::ZERO)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Total runs: 1"));
        assert!(text.contains("Passed: 1"));
        assert!(text.contains("Greedy seed 4"));
    }
}
