use crate::model::thresholds::{HitCombination, ZScoreSource};
use crate::report::{format_opt, RunReport};

/// Human-readable run summary, one screenful per run.
pub fn render_report_text(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("Plate Screening Report\n");
    out.push_str("======================\n\n");

    out.push_str("1. Run\n");
    out.push_str(&format!("Tool: {} {}\n", report.tool, report.version));
    out.push_str(&format!(
        "Wells: {} across {} plate(s)\n",
        report.wells.len(),
        report.plates.len()
    ));
    let combination = match report.thresholds.hit_combination {
        HitCombination::And => "reporter AND vitality",
        HitCombination::Or => "reporter OR vitality",
    };
    let source = match report.thresholds.hit_z_source {
        ZScoreSource::Robust => "robust Z",
        ZScoreSource::BScore => "B-score",
    };
    out.push_str(&format!(
        "Hit rule: {combination}, scored on {source} at cutoff {}\n\n",
        report.thresholds.z_cutoff
    ));

    out.push_str("2. Hits\n");
    for plate in &report.plates {
        out.push_str(&format!(
            "{}: platform={} reporter={} vitality={} of {} wells\n",
            plate.plate, plate.platform_hits, plate.reporter_hits, plate.vitality_hits, plate.wells
        ));
        let patterns: Vec<String> = plate
            .patterns
            .iter()
            .filter(|p| p.count > 0)
            .map(|p| format!("{}={}", p.pattern.label(), p.count))
            .collect();
        if !patterns.is_empty() {
            out.push_str(&format!("   patterns: {}\n", patterns.join(", ")));
        }
    }
    out.push('\n');

    out.push_str("3. Plate quality\n");
    for record in &report.convergence {
        if record.converged {
            out.push_str(&format!(
                "{} {}: polish converged in {} iteration(s)\n",
                record.plate, record.metric, record.iterations
            ));
        } else {
            out.push_str(&format!(
                "{} {}: polish stopped at the cap after {} iteration(s), max delta {:.3e}\n",
                record.plate, record.metric, record.iterations, record.max_delta
            ));
        }
    }
    for summary in &report.edge {
        match &summary.error {
            Some(error) => {
                out.push_str(&format!(
                    "{}: edge diagnostics unavailable: {error}\n",
                    summary.plate
                ));
            }
            None => {
                for r in &summary.reports {
                    out.push_str(&format!(
                        "{} {}: edge severity {} (effect size {})\n",
                        r.plate,
                        r.metric,
                        r.severity.label(),
                        format_opt(r.effect_size)
                    ));
                }
            }
        }
    }
    out.push('\n');

    out.push_str("4. Warnings\n");
    if report.warnings.is_empty() {
        out.push_str("none\n");
    } else {
        for warning in &report.warnings {
            out.push_str(&format!("- {warning}\n"));
        }
    }

    out
}
