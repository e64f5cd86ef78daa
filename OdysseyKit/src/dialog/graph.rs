//! Graph queries over a [`Dlg`]: flattening, path lookup and tree printing

use super::types::{Dlg, DlgLink, NodeId};
use std::collections::HashSet;
use std::fmt::Write as _;

/// What [`Dlg::find_paths`] should locate.
#[derive(Debug, Clone, Copy)]
pub enum DlgTarget<'a> {
    Node(NodeId),
    Link(&'a DlgLink),
}

/// Result of [`Dlg::lookup_from_path`].
#[derive(Debug)]
pub enum DlgPathTarget<'a> {
    Node(NodeId),
    Link(&'a DlgLink),
    /// `EntryList` or `ReplyList` as a whole.
    Nodes(Vec<NodeId>),
    /// `StartingList` or a node's link list as a whole.
    Links(&'a [DlgLink]),
}

impl Dlg {
    /// Every entry reachable from the starters.
    ///
    /// Nodes are discovered depth first with links followed in stored order,
    /// then stably sorted so nodes that have a `list_index` keep it and
    /// never-serialized nodes (`-1`) go last.
    #[must_use]
    pub fn all_entries(&self) -> Vec<NodeId> {
        self.reachable(true)
    }

    /// Every reply reachable from the starters, ordered like [`Dlg::all_entries`].
    #[must_use]
    pub fn all_replies(&self) -> Vec<NodeId> {
        self.reachable(false)
    }

    fn reachable(&self, entries: bool) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.starters.iter().rev().filter_map(|link| link.node).collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = &self[id];
            if node.is_entry() == entries {
                found.push(id);
            }
            stack.extend(node.links().iter().rev().filter_map(|link| link.node));
        }

        found.sort_by_key(|&id| {
            let list_index = self[id].data().list_index;
            (list_index == -1, list_index)
        });
        found
    }

    /// Locations of `target` expressed as GFF paths such as
    /// `EntryList/2/RepliesList/0` or `StartingList/1`.
    ///
    /// A node is located through every link that points at it. Positions
    /// follow [`Dlg::all_entries`]/[`Dlg::all_replies`] and stored link order.
    #[must_use]
    pub fn find_paths(&self, target: DlgTarget<'_>) -> Vec<String> {
        let points_at = |link: &DlgLink| match target {
            DlgTarget::Node(id) => link.node == Some(id),
            DlgTarget::Link(wanted) => link == wanted,
        };

        let mut paths: Vec<String> = self
            .starters
            .iter()
            .enumerate()
            .filter(|(_, link)| points_at(link))
            .map(|(k, _)| format!("StartingList/{k}"))
            .collect();

        for (list, sublist, nodes) in [
            ("EntryList", "RepliesList", self.all_entries()),
            ("ReplyList", "EntriesList", self.all_replies()),
        ] {
            for (i, id) in nodes.into_iter().enumerate() {
                for (j, link) in self[id].links().iter().enumerate() {
                    if points_at(link) {
                        paths.push(format!("{list}/{i}/{sublist}/{j}"));
                    }
                }
            }
        }
        paths
    }

    /// Resolves a GFF path back to a node, link or list.
    ///
    /// Accepted shapes are `StartingList[/k]`, `EntryList[/i[/RepliesList[/j]]]`
    /// and `ReplyList[/i[/EntriesList[/j]]]`. Returns `None` for anything else
    /// or an index out of range.
    #[must_use]
    pub fn lookup_from_path(&self, path: &str) -> Option<DlgPathTarget<'_>> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        let index = |part: &str| part.parse::<usize>().ok();

        match parts.as_slice() {
            ["StartingList"] => Some(DlgPathTarget::Links(&self.starters)),
            ["StartingList", k] => self.starters.get(index(k)?).map(DlgPathTarget::Link),
            [list @ ("EntryList" | "ReplyList"), rest @ ..] => {
                let entries = *list == "EntryList";
                let nodes = if entries { self.all_entries() } else { self.all_replies() };
                let sublist = if entries { "RepliesList" } else { "EntriesList" };
                match rest {
                    [] => Some(DlgPathTarget::Nodes(nodes)),
                    [i] => nodes.get(index(i)?).copied().map(DlgPathTarget::Node),
                    [i, name] if *name == sublist => {
                        let id = *nodes.get(index(i)?)?;
                        Some(DlgPathTarget::Links(self[id].links()))
                    }
                    [i, name, j] if *name == sublist => {
                        let id = *nodes.get(index(i)?)?;
                        self[id].links().get(index(j)?).map(DlgPathTarget::Link)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Renders the conversation as an indented tree, one node per line.
    ///
    /// A node already printed higher up is shown once more with a
    /// `(see above)` marker and not expanded again.
    #[must_use]
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        let mut printed = HashSet::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .starters
            .iter()
            .rev()
            .filter_map(|link| link.node)
            .map(|id| (id, 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            let node = &self[id];
            let data = node.data();
            let _ = write!(out, "{:indent$}[{}] ", "", node.kind(), indent = depth * 2);
            if let Some(speaker) = node.speaker().filter(|s| !s.is_empty()) {
                let _ = write!(out, "{speaker}: ");
            }
            let _ = write!(out, "{}", data.text);

            if printed.insert(id) {
                out.push('\n');
                stack.extend(
                    node.links()
                        .iter()
                        .rev()
                        .filter_map(|link| link.node)
                        .map(|child| (child, depth + 1)),
                );
            } else {
                out.push_str(" (see above)\n");
            }
        }
        out
    }
}
