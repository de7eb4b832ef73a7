//! Markdown documentation of registered metrics.

use super::definition::MetricDescriptor;

/// Render metric descriptors as a markdown table, sorted by name.
pub fn render_markdown(metrics: &[MetricDescriptor]) -> String {
    let mut sorted: Vec<&MetricDescriptor> = metrics.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    out.push_str("| Name | Kind | Labels | Description |\n");
    out.push_str("|------|------|--------|-------------|\n");
    for metric in sorted {
        let labels = if metric.labels.is_empty() {
            "-".to_string()
        } else {
            metric.labels.join(", ")
        };
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            metric.name,
            metric.kind,
            labels,
            metric.help.replace('|', "\\|")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricKind;

    fn descriptor(name: &str, labels: &[&str]) -> MetricDescriptor {
        MetricDescriptor {
            name: name.to_string(),
            help: format!("Help for {}.", name),
            kind: MetricKind::Gauge,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            buckets: None,
        }
    }

    #[test]
    fn test_render_sorted_table() {
        let doc = render_markdown(&[descriptor("z_metric", &[]), descriptor("a_metric", &["node", "phase"])]);
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "| a_metric | gauge | node, phase | Help for a_metric. |");
        assert_eq!(lines[3], "| z_metric | gauge | - | Help for z_metric. |");
    }
}
