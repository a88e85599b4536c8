//! Session statistics.

use std::path::PathBuf;
use std::time::Duration;

use observability::RoundStatsAggregator;
use scenario_runtime::RunSummary;
use telemetry::MetricsSnapshot;

/// Statistics from a scenario session
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Controller run summary
    pub summary: RunSummary,

    /// Final per-sink telemetry counters
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Wall-clock duration including connect and teardown
    pub duration: Duration,

    pub output_dir: PathBuf,
}

impl SessionStats {
    /// Per-round reward/length statistics
    pub fn rounds(&self) -> RoundStatsAggregator {
        let mut rounds = RoundStatsAggregator::new();
        for (reward, length) in self
            .summary
            .round_rewards
            .iter()
            .zip(&self.summary.round_lengths_sec)
        {
            rounds.update_round(*reward, *length);
        }
        rounds
    }

    /// Tick rate actually achieved over the whole session
    pub fn ticks_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Export end-of-run counters
    pub fn record_metrics(&self) {
        observability::record_run_outcome(
            self.summary.rounds_completed,
            self.summary.stopped_by_operator,
        );
        for (name, sink) in &self.sinks {
            observability::record_sink_totals(name, sink.written, sink.failed, sink.dropped);
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = &self.summary;
        let rounds = self.rounds().summary();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Scenario Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Rounds completed: {}", summary.rounds_completed);
        println!("   ├─ Ticks: {} ({:.1}/s)", summary.ticks, self.ticks_per_sec());
        println!("   ├─ Observation misses: {}", summary.observation_misses);
        println!("   ├─ Collisions: {}", summary.collisions);
        println!("   ├─ Experiences: {}", summary.experiences);
        println!("   ├─ Final mode: {}", summary.final_mode);
        println!("   └─ Stopped by operator: {}", summary.stopped_by_operator);

        println!("\n📈 Rounds");
        println!("   ├─ Reward: {}", rounds.reward);
        println!("   ├─ Length (s): {}", rounds.length_sec);
        match rounds.best_round {
            Some((index, reward)) => println!("   └─ Best round: #{index} ({reward:.3})"),
            None => println!("   └─ Best round: N/A"),
        }

        if !self.sinks.is_empty() {
            println!("\n📤 Telemetry Sinks");
            for (i, (name, sink)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: written={}, failed={}, dropped={}",
                    prefix, name, sink.written, sink.failed, sink.dropped
                );
            }
        }

        if summary.teardown_failures > 0 {
            println!("\n⚠️  Teardown left {} actor(s) behind", summary.teardown_failures);
        }

        println!("\n📁 Output: {}", self.output_dir.display());
        for export in &summary.telemetry_exports {
            println!("   └─ {}", export.display());
        }

        println!();
    }
}
