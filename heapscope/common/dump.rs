use std::fmt::Write;

use crate::{graph::Snapshot, Options};

/// Write a line of output to the dump buffer if one is configured, otherwise to stdout.
pub fn dump_line(options: &Options, line: &str) {
    match options.dump_buffer() {
        Some(mut buffer) => {
            buffer.push_str(line);
            buffer.push('\n');
        }
        None => println!("{line}"),
    }
}

/// One-line human readable summary of a snapshot: counts followed by the vertex labels.
///
/// Edges whose endpoints are missing from the snapshot are not counted.
pub fn summarize(snapshot: &Snapshot) -> String {
    let mut summary = format!(
        "{} vertices, {} edges",
        snapshot.vertices.len(),
        snapshot.visible_edges().count()
    );

    if let Some(builtins) = &snapshot.builtins {
        let _ = write!(summary, ", {} builtins", builtins.len());
    }

    let labels: Vec<&str> = snapshot
        .vertices
        .iter()
        .map(|vertex| vertex.label.as_str())
        .collect();
    let _ = write!(summary, ": [{}]", labels.join(", "));

    summary
}
