//! Dialog data types for `KotOR` conversations
//!
//! Nodes live in an arena owned by [`Dlg`] and are addressed by [`NodeId`].
//! Links hold a `NodeId`, so several links can share one node and the graph
//! may contain cycles without any node being copied.

use crate::formats::common::{Color, LocalizedString, ResRef};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut};
use uuid::Uuid;

/// A fresh process-local identity token.
pub(crate) fn new_uid() -> u64 {
    Uuid::new_v4().as_u128() as u64
}

/// Handle of a node inside its [`Dlg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena (not its `list_index`).
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Terminal the conversation is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComputerType {
    #[default]
    Modern,
    Ancient,
}

impl ComputerType {
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            ComputerType::Modern => 0,
            ComputerType::Ancient => 1,
        }
    }

    #[must_use]
    pub fn from_id(id: u8) -> Self {
        if id == 1 { ComputerType::Ancient } else { ComputerType::Modern }
    }
}

/// How the conversation is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationType {
    #[default]
    Human,
    Computer,
    Other,
    Unknown,
}

impl ConversationType {
    #[must_use]
    pub fn id(self) -> i32 {
        match self {
            ConversationType::Human => 0,
            ConversationType::Computer => 1,
            ConversationType::Other => 2,
            ConversationType::Unknown => 3,
        }
    }

    #[must_use]
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => ConversationType::Human,
            1 => ConversationType::Computer,
            2 => ConversationType::Other,
            _ => ConversationType::Unknown,
        }
    }
}

/// Camera stunt played by a participant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DlgStunt {
    pub participant: String,
    pub stunt_model: ResRef,
}

/// Animation played by a participant while a node is shown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DlgAnimation {
    pub animation_id: u16,
    pub participant: String,
}

/// A conditional edge to a node of the opposite kind.
///
/// Equality is identity: two links are equal only if they are the same link.
#[derive(Debug)]
pub struct DlgLink {
    uid: u64,
    /// Target node; `None` for a link that points nowhere yet.
    pub node: Option<NodeId>,
    /// Position in the owning list when last read or written, `-1` if never.
    pub list_index: i32,
    pub active1: ResRef,
    pub active2: ResRef,
    pub logic: bool,
    pub active1_not: bool,
    pub active2_not: bool,
    pub active1_params: [i32; 5],
    pub active1_param_str: String,
    pub active2_params: [i32; 5],
    pub active2_param_str: String,
    /// The target is owned by another link; this one is a back reference.
    pub is_child: bool,
    pub comment: String,
}

impl DlgLink {
    #[must_use]
    pub fn new(node: Option<NodeId>) -> Self {
        DlgLink {
            uid: new_uid(),
            node,
            list_index: -1,
            active1: ResRef::blank(),
            active2: ResRef::blank(),
            logic: false,
            active1_not: false,
            active2_not: false,
            active1_params: [0; 5],
            active1_param_str: String::new(),
            active2_params: [0; 5],
            active2_param_str: String::new(),
            is_child: false,
            comment: String::new(),
        }
    }

    /// Identity token, stable for the lifetime of the link.
    #[must_use]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// A second handle on the same link: identical fields and identity.
    pub(crate) fn share(&self) -> DlgLink {
        DlgLink {
            uid: self.uid,
            node: self.node,
            list_index: self.list_index,
            active1: self.active1.clone(),
            active2: self.active2.clone(),
            logic: self.logic,
            active1_not: self.active1_not,
            active2_not: self.active2_not,
            active1_params: self.active1_params,
            active1_param_str: self.active1_param_str.clone(),
            active2_params: self.active2_params,
            active2_param_str: self.active2_param_str.clone(),
            is_child: self.is_child,
            comment: self.comment.clone(),
        }
    }
}

impl Default for DlgLink {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PartialEq for DlgLink {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for DlgLink {}

impl Hash for DlgLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

/// Fields shared by entries and replies.
#[derive(Debug)]
pub struct NodeData {
    uid: u64,
    /// Position in `EntryList`/`ReplyList` when last read or written, `-1`
    /// for a node that has never been serialized.
    pub list_index: i32,
    pub comment: String,
    pub camera_angle: u32,
    pub camera_anim: Option<u16>,
    pub camera_id: Option<i32>,
    pub camera_effect: Option<i32>,
    pub camera_fov: Option<f32>,
    pub camera_height: Option<f32>,
    pub target_height: Option<f32>,
    /// `-1` lets the engine pick.
    pub delay: i32,
    pub fade_type: u8,
    pub fade_color: Option<Color>,
    pub fade_delay: Option<f32>,
    pub fade_length: Option<f32>,
    pub text: LocalizedString,
    pub script1: ResRef,
    pub script2: ResRef,
    pub sound: ResRef,
    pub sound_exists: bool,
    pub vo_resref: ResRef,
    pub wait_flags: u32,
    pub animations: Vec<DlgAnimation>,
    pub quest: String,
    pub quest_entry: Option<u32>,
    pub plot_index: i32,
    pub plot_xp_percentage: f32,
    pub listener: String,

    // KotOR II only
    pub script1_params: [i32; 5],
    pub script1_param_str: String,
    pub script2_params: [i32; 5],
    pub script2_param_str: String,
    pub alien_race_node: i32,
    pub emotion_id: i32,
    pub facial_id: i32,
    pub node_id: i32,
    pub unskippable: bool,
    pub post_proc_node: i32,
    pub record_no_vo_override: bool,
    pub record_vo: bool,
    pub vo_text_changed: bool,

    /// Outgoing links, in stored order.
    pub links: Vec<DlgLink>,
}

impl Default for NodeData {
    fn default() -> Self {
        NodeData {
            uid: new_uid(),
            list_index: -1,
            comment: String::new(),
            camera_angle: 0,
            camera_anim: None,
            camera_id: None,
            camera_effect: None,
            camera_fov: None,
            camera_height: None,
            target_height: None,
            delay: -1,
            fade_type: 0,
            fade_color: None,
            fade_delay: None,
            fade_length: None,
            text: LocalizedString::from_invalid(),
            script1: ResRef::blank(),
            script2: ResRef::blank(),
            sound: ResRef::blank(),
            sound_exists: false,
            vo_resref: ResRef::blank(),
            wait_flags: 0,
            animations: Vec::new(),
            quest: String::new(),
            quest_entry: None,
            plot_index: -1,
            plot_xp_percentage: 0.0,
            listener: String::new(),
            script1_params: [0; 5],
            script1_param_str: String::new(),
            script2_params: [0; 5],
            script2_param_str: String::new(),
            alien_race_node: 0,
            emotion_id: 0,
            facial_id: 0,
            node_id: 0,
            unskippable: false,
            post_proc_node: 0,
            record_no_vo_override: false,
            record_vo: false,
            vo_text_changed: false,
            links: Vec::new(),
        }
    }
}

impl NodeData {
    /// Identity token, stable for the lifetime of the node.
    #[must_use]
    pub fn uid(&self) -> u64 {
        self.uid
    }
}

/// A line spoken by an NPC.
#[derive(Debug, Default)]
pub struct DlgEntry {
    pub speaker: String,
    pub base: NodeData,
}

/// A line the player can choose.
#[derive(Debug, Default)]
pub struct DlgReply {
    pub base: NodeData,
}

/// A dialog node: exactly one of entry or reply.
#[derive(Debug)]
pub enum DlgNode {
    Entry(DlgEntry),
    Reply(DlgReply),
}

impl DlgNode {
    #[must_use]
    pub fn data(&self) -> &NodeData {
        match self {
            DlgNode::Entry(entry) => &entry.base,
            DlgNode::Reply(reply) => &reply.base,
        }
    }

    pub fn data_mut(&mut self) -> &mut NodeData {
        match self {
            DlgNode::Entry(entry) => &mut entry.base,
            DlgNode::Reply(reply) => &mut reply.base,
        }
    }

    #[must_use]
    pub fn is_entry(&self) -> bool {
        matches!(self, DlgNode::Entry(_))
    }

    #[must_use]
    pub fn is_reply(&self) -> bool {
        matches!(self, DlgNode::Reply(_))
    }

    /// Speaker tag of an entry; replies have none.
    #[must_use]
    pub fn speaker(&self) -> Option<&str> {
        match self {
            DlgNode::Entry(entry) => Some(&entry.speaker),
            DlgNode::Reply(_) => None,
        }
    }

    #[must_use]
    pub fn links(&self) -> &[DlgLink] {
        &self.data().links
    }

    /// `"Entry"` or `"Reply"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        if self.is_entry() { "Entry" } else { "Reply" }
    }
}

impl PartialEq for DlgNode {
    fn eq(&self, other: &Self) -> bool {
        self.data().uid == other.data().uid
    }
}

impl Eq for DlgNode {}

impl Hash for DlgNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data().uid.hash(state);
    }
}

/// A conversation.
#[derive(Debug)]
pub struct Dlg {
    nodes: Vec<DlgNode>,
    /// Entry points into the graph; each points at an entry.
    pub starters: Vec<DlgLink>,
    pub stunts: Vec<DlgStunt>,

    pub word_count: u32,
    pub on_abort: ResRef,
    pub on_end: ResRef,
    pub skippable: bool,
    pub ambient_track: ResRef,
    pub animated_cut: bool,
    pub camera_model: ResRef,
    pub computer_type: ComputerType,
    pub conversation_type: ConversationType,
    pub old_hit_check: bool,
    pub unequip_hands: bool,
    pub unequip_items: bool,
    pub vo_id: String,

    // KotOR II only
    pub alien_race_owner: i32,
    pub post_proc_owner: i32,
    pub record_no_vo: bool,
    pub next_node_id: i32,

    // Deprecated, still written by the toolset
    pub delay_entry: u32,
    pub delay_reply: u32,
}

impl Default for Dlg {
    fn default() -> Self {
        Dlg {
            nodes: Vec::new(),
            starters: Vec::new(),
            stunts: Vec::new(),
            word_count: 0,
            on_abort: ResRef::blank(),
            on_end: ResRef::blank(),
            skippable: false,
            ambient_track: ResRef::blank(),
            animated_cut: false,
            camera_model: ResRef::blank(),
            computer_type: ComputerType::Modern,
            conversation_type: ConversationType::Human,
            old_hit_check: false,
            unequip_hands: false,
            unequip_items: false,
            vo_id: String::new(),
            alien_race_owner: 0,
            post_proc_owner: 0,
            record_no_vo: false,
            next_node_id: 0,
            delay_entry: 0,
            delay_reply: 0,
        }
    }
}

impl Dlg {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to the arena. It is unreachable until linked.
    pub fn add_entry(&mut self, entry: DlgEntry) -> NodeId {
        self.push_node(DlgNode::Entry(entry))
    }

    /// Adds a reply to the arena. It is unreachable until linked.
    pub fn add_reply(&mut self, reply: DlgReply) -> NodeId {
        self.push_node(DlgNode::Reply(reply))
    }

    fn push_node(&mut self, node: DlgNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Appends a starter pointing at `entry` and returns it.
    ///
    /// # Panics
    /// Panics if `entry` is not an entry of this dialog.
    pub fn add_starter(&mut self, entry: NodeId) -> &mut DlgLink {
        assert!(self[entry].is_entry(), "starters must point at entries");
        self.starters.push(DlgLink::new(Some(entry)));
        let last = self.starters.len() - 1;
        &mut self.starters[last]
    }

    /// Links `parent` to `child` and returns the new link.
    ///
    /// # Panics
    /// Panics if both nodes are the same kind.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> &mut DlgLink {
        assert!(
            self[parent].is_entry() != self[child].is_entry(),
            "links must join an entry and a reply"
        );
        let links = &mut self[parent].data_mut().links;
        links.push(DlgLink::new(Some(child)));
        let last = links.len() - 1;
        &mut links[last]
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&DlgNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut DlgNode> {
        self.nodes.get_mut(id.0)
    }

    /// Every node in the arena, reachable or not.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DlgNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finds a node by its identity token.
    #[must_use]
    pub fn find_uid(&self, uid: u64) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.data().uid == uid)
            .map(NodeId)
    }
}

impl Index<NodeId> for Dlg {
    type Output = DlgNode;

    fn index(&self, id: NodeId) -> &DlgNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Dlg {
    fn index_mut(&mut self, id: NodeId) -> &mut DlgNode {
        &mut self.nodes[id.0]
    }
}
