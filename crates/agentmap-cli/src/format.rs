/// Output helpers shared by every subcommand.
///
/// Each command builds its result once and hands two renderers to [`emit`]:
/// a human renderer writing aligned text, and a JSON value. [`emit`] locks
/// stdout, picks the renderer for the requested [`OutputFormat`], and maps
/// write failures to [`CliError`].
use std::io::Write;

use agentmap_core::{Edge, Node, NodeType};
use serde::Serialize;

use crate::OutputFormat;
use crate::error::{CliError, stdout_error};

/// Writes either the human rendering or `json` to stdout.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if stdout cannot be written or `json` cannot
/// be encoded.
pub fn emit<T, F>(format: OutputFormat, json: &T, human: F) -> Result<(), CliError>
where
    T: Serialize,
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Human => human(&mut out),
        OutputFormat::Json => write_json(&mut out, json),
    }
    .map_err(|e| stdout_error(&e))
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write + ?Sized, T: Serialize>(w: &mut W, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(w, "{json}")
}

/// Short bracketed role tag, e.g. `[agent]`.
pub fn type_tag(t: NodeType) -> String {
    format!("[{}]", t.as_str())
}

/// `id [type] "label"`, omitting the label when it equals the id.
pub fn node_line(node: &Node) -> String {
    let label = node.display_label();
    if label == node.id.as_str() {
        format!("{} {}", node.id, type_tag(node.node_type))
    } else {
        format!("{} {} {label:?}", node.id, type_tag(node.node_type))
    }
}

/// `source -> target (N calls)`, with errors when non-zero.
pub fn edge_line(edge: &Edge) -> String {
    let calls = pluralize(edge.call_count, "call", "calls");
    if edge.error_count > 0 {
        format!(
            "{} -> {} ({} {calls}, {} {})",
            edge.source,
            edge.target,
            edge.call_count,
            edge.error_count,
            pluralize(edge.error_count, "error", "errors")
        )
    } else {
        format!("{} -> {} ({} {calls})", edge.source, edge.target, edge.call_count)
    }
}

/// Joins ids with ` -> `.
pub fn chain<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" -> ")
}

/// Returns `singular` when `count == 1`, `plural` otherwise.
pub fn pluralize<'a>(count: u64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use agentmap_core::NodeId;

    use super::*;

    fn nid(s: &str) -> NodeId {
        NodeId::try_from(s).expect("valid NodeId")
    }

    #[test]
    fn node_line_omits_label_equal_to_id() {
        let n = Node::new(nid("planner"), NodeType::Agent, "planner");
        assert_eq!(node_line(&n), "planner [agent]");
        let n = Node::new(nid("p1"), NodeType::SubAgent, "Planner");
        assert_eq!(node_line(&n), "p1 [sub_agent] \"Planner\"");
    }

    #[test]
    fn edge_line_mentions_errors_only_when_present() {
        let mut e = Edge::new(nid("a"), nid("b"), 1);
        assert_eq!(edge_line(&e), "a -> b (1 call)");
        e.call_count = 4;
        e.error_count = 2;
        assert_eq!(edge_line(&e), "a -> b (4 calls, 2 errors)");
    }

    #[test]
    fn chain_joins_with_arrows() {
        assert_eq!(chain(&["a", "b", "c"]), "a -> b -> c");
        assert_eq!(chain::<&str>(&[]), "");
    }

    #[test]
    fn write_json_is_pretty_with_trailing_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({"a": 1})).expect("write");
        let s = String::from_utf8(buf).expect("utf8");
        assert_eq!(s, "{\n  \"a\": 1\n}\n");
    }
}
