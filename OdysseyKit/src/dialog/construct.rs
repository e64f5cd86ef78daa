//! Build a [`Dlg`] graph from a DLG GFF tree

use super::types::{
    ComputerType, ConversationType, Dlg, DlgAnimation, DlgEntry, DlgLink, DlgNode, DlgReply, DlgStunt, NodeData, NodeId,
};
use crate::formats::common::{Color, LocalizedString, ResRef};
use crate::formats::gff::{Gff, GffContent, GffList, GffStruct};
use glam::Vec3;

const DELAY_DEFAULT: u32 = 0xFFFF_FFFF;

/// Interpret a GFF tree as a conversation.
///
/// Never fails. Missing fields take their defaults, and a link whose `Index`
/// points outside the target list is logged and left out of the graph.
#[must_use]
pub fn construct_dlg(gff: &Gff) -> Dlg {
    if gff.content != GffContent::Dlg {
        tracing::warn!("Constructing a dialog from {} content", gff.content);
    }
    let root = &gff.root;
    let mut dlg = Dlg::new();

    dlg.word_count = root.acquire("NumWords", 0);
    dlg.on_abort = root.acquire("EndConverAbort", ResRef::blank());
    dlg.on_end = root.acquire("EndConversation", ResRef::blank());
    dlg.skippable = root.acquire("Skippable", false);
    dlg.ambient_track = root.acquire("AmbientTrack", ResRef::blank());
    dlg.animated_cut = root.acquire("AnimatedCut", false);
    dlg.camera_model = root.acquire("CameraModel", ResRef::blank());
    dlg.computer_type = ComputerType::from_id(root.acquire("ComputerType", 0));
    dlg.conversation_type = ConversationType::from_id(root.acquire("ConversationType", 0));
    dlg.old_hit_check = root.acquire("OldHitCheck", false);
    dlg.unequip_hands = root.acquire("UnequipHItem", false);
    dlg.unequip_items = root.acquire("UnequipItems", false);
    dlg.vo_id = root.acquire("VO_ID", String::new());
    dlg.alien_race_owner = root.acquire("AlienRaceOwner", 0);
    dlg.post_proc_owner = root.acquire("PostProcOwner", 0);
    dlg.record_no_vo = root.acquire("RecordNoVO", false);
    dlg.next_node_id = root.acquire("NextNodeID", 0);
    dlg.delay_entry = root.acquire("DelayEntry", 0);
    dlg.delay_reply = root.acquire("DelayReply", 0);

    let empty = GffList::new();
    let entry_list = root.get_list("EntryList").unwrap_or(&empty);
    let reply_list = root.get_list("ReplyList").unwrap_or(&empty);

    // Allocate every node first so links can point forward and backward
    let entries: Vec<NodeId> = (0..entry_list.len())
        .map(|_| dlg.add_entry(DlgEntry::default()))
        .collect();
    let replies: Vec<NodeId> = (0..reply_list.len())
        .map(|_| dlg.add_reply(DlgReply::default()))
        .collect();

    for (i, gff_struct) in entry_list.iter().enumerate() {
        let mut data = read_node(gff_struct);
        data.list_index = list_position(i);
        data.links = read_links(gff_struct, "RepliesList", &replies, &format!("EntryList/{i}"));
        dlg[entries[i]] = DlgNode::Entry(DlgEntry {
            speaker: gff_struct.acquire("Speaker", String::new()),
            base: data,
        });
    }

    for (i, gff_struct) in reply_list.iter().enumerate() {
        let mut data = read_node(gff_struct);
        data.list_index = list_position(i);
        data.links = read_links(gff_struct, "EntriesList", &entries, &format!("ReplyList/{i}"));
        dlg[replies[i]] = DlgNode::Reply(DlgReply { base: data });
    }

    if let Some(starting_list) = root.get_list("StartingList") {
        dlg.starters = collect_links(starting_list, &entries, "StartingList", false);
    }

    if let Some(stunt_list) = root.get_list("StuntList") {
        dlg.stunts = stunt_list
            .iter()
            .map(|stunt| DlgStunt {
                participant: stunt.acquire("Participant", String::new()),
                stunt_model: stunt.acquire("StuntModel", ResRef::blank()),
            })
            .collect();
    }

    dlg
}

fn list_position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn read_links(gff_struct: &GffStruct, label: &str, targets: &[NodeId], owner: &str) -> Vec<DlgLink> {
    match gff_struct.get_list(label) {
        Some(list) => collect_links(list, targets, &format!("{owner}/{label}"), true),
        None => Vec::new(),
    }
}

fn collect_links(list: &GffList, targets: &[NodeId], path: &str, node_list: bool) -> Vec<DlgLink> {
    let mut links = Vec::with_capacity(list.len());
    for (j, link_struct) in list.iter().enumerate() {
        let index: u32 = link_struct.acquire("Index", 0);
        let Some(&target) = usize::try_from(index).ok().and_then(|i| targets.get(i)) else {
            tracing::error!(
                "Index field value '{}' does not point to a valid node ({}/{})",
                index,
                path,
                j
            );
            continue;
        };
        let mut link = read_link(link_struct, target);
        link.list_index = list_position(j);
        if node_list {
            link.is_child = link_struct.acquire("IsChild", false);
            link.comment = link_struct.acquire("LinkComment", String::new());
        }
        links.push(link);
    }
    links
}

fn read_link(gff_struct: &GffStruct, target: NodeId) -> DlgLink {
    let mut link = DlgLink::new(Some(target));
    link.active1 = gff_struct.acquire("Active", ResRef::blank());
    link.active2 = gff_struct.acquire("Active2", ResRef::blank());
    link.logic = gff_struct.acquire("Logic", false);
    link.active1_not = gff_struct.acquire("Not", false);
    link.active2_not = gff_struct.acquire("Not2", false);
    let params = link.active1_params.iter_mut().zip(link.active2_params.iter_mut());
    for (n, (first, second)) in params.enumerate() {
        *first = gff_struct.acquire(&format!("Param{}", n + 1), 0);
        *second = gff_struct.acquire(&format!("Param{}b", n + 1), 0);
    }
    link.active1_param_str = gff_struct.acquire("ParamStrA", String::new());
    link.active2_param_str = gff_struct.acquire("ParamStrB", String::new());
    link
}

fn read_node(gff_struct: &GffStruct) -> NodeData {
    let mut node = NodeData::default();
    node.text = gff_struct.acquire("Text", LocalizedString::from_invalid());
    node.listener = gff_struct.acquire("Listener", String::new());
    node.vo_resref = gff_struct.acquire("VO_ResRef", ResRef::blank());
    node.script1 = gff_struct.acquire("Script", ResRef::blank());
    node.comment = gff_struct.acquire("Comment", String::new());
    node.sound = gff_struct.acquire("Sound", ResRef::blank());
    node.quest = gff_struct.acquire("Quest", String::new());
    node.plot_index = gff_struct.acquire("PlotIndex", -1);
    node.plot_xp_percentage = gff_struct.acquire("PlotXPPercentage", 0.0);
    node.wait_flags = gff_struct.acquire("WaitFlags", 0);
    node.camera_angle = gff_struct.acquire("CameraAngle", 0);
    node.fade_type = gff_struct.acquire("FadeType", 0);
    node.sound_exists = gff_struct.acquire("SoundExists", false);

    let delay: u32 = gff_struct.acquire("Delay", 0);
    node.delay = if delay == DELAY_DEFAULT { -1 } else { delay as i32 };

    if gff_struct.exists("QuestEntry") {
        node.quest_entry = Some(gff_struct.acquire("QuestEntry", 0));
    }
    if gff_struct.exists("FadeDelay") {
        node.fade_delay = Some(gff_struct.acquire("FadeDelay", 0.0));
    }
    if gff_struct.exists("FadeLength") {
        node.fade_length = Some(gff_struct.acquire("FadeLength", 0.0));
    }
    if gff_struct.exists("FadeColor") {
        node.fade_color = Some(Color::from_bgr_vector3(gff_struct.acquire("FadeColor", Vec3::ZERO)));
    }
    if gff_struct.exists("CameraID") {
        node.camera_id = Some(gff_struct.acquire("CameraID", 0));
    }
    if gff_struct.exists("CameraAnimation") {
        node.camera_anim = Some(gff_struct.acquire("CameraAnimation", 0));
    }
    if gff_struct.exists("CamVidEffect") {
        node.camera_effect = Some(gff_struct.acquire("CamVidEffect", 0));
    }
    if gff_struct.exists("CamFieldOfView") {
        node.camera_fov = Some(gff_struct.acquire("CamFieldOfView", 0.0));
    }
    if gff_struct.exists("CamHeightOffset") {
        node.camera_height = Some(gff_struct.acquire("CamHeightOffset", 0.0));
    }
    if gff_struct.exists("TarHeightOffset") {
        node.target_height = Some(gff_struct.acquire("TarHeightOffset", 0.0));
    }

    if let Some(anim_list) = gff_struct.get_list("AnimList") {
        node.animations = anim_list
            .iter()
            .map(|anim| DlgAnimation {
                animation_id: anim.acquire("Animation", 0),
                participant: anim.acquire("Participant", String::new()),
            })
            .collect();
    }

    let params = node.script1_params.iter_mut().zip(node.script2_params.iter_mut());
    for (n, (first, second)) in params.enumerate() {
        *first = gff_struct.acquire(&format!("ActionParam{}", n + 1), 0);
        *second = gff_struct.acquire(&format!("ActionParam{}b", n + 1), 0);
    }
    node.script1_param_str = gff_struct.acquire("ActionParamStrA", String::new());
    node.script2_param_str = gff_struct.acquire("ActionParamStrB", String::new());
    node.script2 = gff_struct.acquire("Script2", ResRef::blank());
    node.alien_race_node = gff_struct.acquire("AlienRaceNode", 0);
    node.emotion_id = gff_struct.acquire("Emotion", 0);
    node.facial_id = gff_struct.acquire("FacialAnim", 0);
    node.node_id = gff_struct.acquire("NodeID", 0);
    node.unskippable = gff_struct.acquire("NodeUnskippable", false);
    node.post_proc_node = gff_struct.acquire("PostProcNode", 0);
    node.record_no_vo_override = gff_struct.acquire("RecordNoVOOverri", false);
    node.record_vo = gff_struct.acquire("RecordVO", false);
    node.vo_text_changed = gff_struct.acquire("VOTextChanged", false);

    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::GffValue;

    fn link(list: &mut GffList, struct_id: i32, index: u32) -> &mut GffStruct {
        let link = list.add(struct_id);
        link.set_uint32("Index", index);
        link.set_resref("Active", "");
        link
    }

    fn sample() -> Gff {
        let mut gff = Gff::new(GffContent::Dlg);
        let root = &mut gff.root;
        root.set_uint32("NumWords", 12);
        root.set_resref("EndConversation", "k_end");
        root.set_uint8("Skippable", 1);
        root.set_int32("ConversationType", 1);

        let entries = root.set_list("EntryList", GffList::new());
        let e0 = entries.add(0);
        e0.set_string("Speaker", "bastila");
        e0.set_locstring("Text", LocalizedString::from_english("Hello"));
        e0.set_uint32("Delay", DELAY_DEFAULT);
        e0.set_vector3("FadeColor", Vec3::new(0.25, 0.5, 1.0));
        let replies_list = e0.set_list("RepliesList", GffList::new());
        link(replies_list, 0, 0).set_uint8("IsChild", 0);
        link(replies_list, 1, 7);

        let replies = root.set_list("ReplyList", GffList::new());
        let r0 = replies.add(0);
        r0.set_uint32("Delay", 30);
        let entries_list = r0.set_list("EntriesList", GffList::new());
        link(entries_list, 0, 0).set_uint8("IsChild", 1);

        let starting = root.set_list("StartingList", GffList::new());
        link(starting, 0, 0).set_resref("Active", "k_cond");
        link(starting, 1, 3);
        gff
    }

    #[test]
    fn test_root_fields() {
        let dlg = construct_dlg(&sample());
        assert_eq!(dlg.word_count, 12);
        assert_eq!(dlg.on_end, ResRef::new("k_end"));
        assert!(dlg.skippable);
        assert_eq!(dlg.conversation_type, ConversationType::Computer);
        assert_eq!(dlg.computer_type, ComputerType::Modern);
    }

    #[test]
    fn test_graph_shape() {
        let dlg = construct_dlg(&sample());
        assert_eq!(dlg.starters.len(), 1);
        assert_eq!(dlg.starters[0].active1, ResRef::new("k_cond"));

        let e0 = dlg.starters[0].node.unwrap();
        assert_eq!(dlg[e0].speaker(), Some("bastila"));
        assert_eq!(dlg[e0].data().text.to_string(), "Hello");
        assert_eq!(dlg[e0].data().list_index, 0);

        // The dangling RepliesList/1 link is dropped
        assert_eq!(dlg[e0].links().len(), 1);
        let r0 = dlg[e0].links()[0].node.unwrap();
        assert!(dlg[r0].is_reply());

        let back = &dlg[r0].links()[0];
        assert!(back.is_child);
        assert_eq!(back.node, Some(e0));
    }

    #[test]
    fn test_delay_and_optionals() {
        let dlg = construct_dlg(&sample());
        let e0 = dlg.starters[0].node.unwrap();
        let r0 = dlg[e0].links()[0].node.unwrap();
        assert_eq!(dlg[e0].data().delay, -1);
        assert_eq!(dlg[r0].data().delay, 30);

        let color = dlg[e0].data().fade_color.unwrap();
        assert_eq!((color.r, color.g, color.b), (1.0, 0.5, 0.25));
        assert!(dlg[e0].data().fade_delay.is_none());
        assert!(dlg[r0].data().fade_color.is_none());
    }

    #[test]
    fn test_empty_gff() {
        let dlg = construct_dlg(&Gff::new(GffContent::Dlg));
        assert!(dlg.starters.is_empty());
        assert_eq!(dlg.node_count(), 0);
        assert!(dlg.vo_id.is_empty());
    }

    #[test]
    fn test_mistyped_fields_fall_back() {
        let mut gff = Gff::new(GffContent::Dlg);
        gff.root.set("NumWords", GffValue::String("many".into()));
        let dlg = construct_dlg(&gff);
        assert_eq!(dlg.word_count, 0);
    }
}
