//! Flatten a [`Dlg`] graph back into a DLG GFF tree

use super::types::{ComputerType, ConversationType, Dlg, DlgLink, NodeData, NodeId};
use crate::formats::common::Game;
use crate::formats::gff::{Gff, GffContent, GffList, GffStruct};
use std::collections::HashMap;

const DELAY_DEFAULT: u32 = 0xFFFF_FFFF;

/// Controls which optional field groups are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismantleOptions {
    /// KotOR II fields are written only for [`Game::K2`].
    pub game: Game,
    /// Write the root `DelayEntry`/`DelayReply` fields.
    pub use_deprecated: bool,
}

impl Default for DismantleOptions {
    fn default() -> Self {
        DismantleOptions {
            game: Game::K2,
            use_deprecated: true,
        }
    }
}

/// Serialise a conversation into a GFF tree.
///
/// Shorthand for [`dismantle_dlg_with`].
///
/// # Panics
/// Panics if a link points at a node of the wrong kind.
#[must_use]
pub fn dismantle_dlg(dlg: &mut Dlg, game: Game, use_deprecated: bool) -> Gff {
    dismantle_dlg_with(dlg, &DismantleOptions { game, use_deprecated })
}

/// Serialise a conversation into a GFF tree.
///
/// Only nodes reachable from the starters are written. Every written node and
/// link has its `list_index` reassigned to its new position, and each list of
/// links is re-sorted by `list_index` first.
///
/// # Panics
/// Panics if a link points at a node of the wrong kind, since such a target
/// has no position in the list its `Index` refers to.
#[must_use]
pub fn dismantle_dlg_with(dlg: &mut Dlg, options: &DismantleOptions) -> Gff {
    let entries = dlg.all_entries();
    let replies = dlg.all_replies();
    let entry_positions = positions(&entries);
    let reply_positions = positions(&replies);
    renumber(dlg, &entries, &replies);

    let k2 = options.game.is_k2();
    let mut gff = Gff::new(GffContent::Dlg);
    write_root(&mut gff.root, dlg, options);

    let entry_list = gff.root.set_list("EntryList", GffList::new());
    for (i, &id) in entries.iter().enumerate() {
        let node = &dlg[id];
        let gff_struct = entry_list.add(to_i32(i));
        write_node(gff_struct, node.data(), k2);
        if let Some(speaker) = node.speaker() {
            gff_struct.set_string("Speaker", speaker);
        }
        write_links(gff_struct, "RepliesList", node.links(), &reply_positions, k2, true);
    }

    let reply_list = gff.root.set_list("ReplyList", GffList::new());
    for (i, &id) in replies.iter().enumerate() {
        let node = &dlg[id];
        let gff_struct = reply_list.add(to_i32(i));
        write_node(gff_struct, node.data(), k2);
        write_links(gff_struct, "EntriesList", node.links(), &entry_positions, k2, true);
    }

    write_links(&mut gff.root, "StartingList", &dlg.starters, &entry_positions, k2, false);

    let stunt_list = gff.root.set_list("StuntList", GffList::new());
    for (i, stunt) in dlg.stunts.iter().enumerate() {
        let gff_struct = stunt_list.add(to_i32(i));
        gff_struct.set_string("Participant", stunt.participant.as_str());
        gff_struct.set_resref("StuntModel", stunt.stunt_model.clone());
    }

    tracing::debug!(
        "Dismantled dialog with {} entries, {} replies, {} starters",
        entries.len(),
        replies.len(),
        dlg.starters.len()
    );
    gff
}

fn to_i32(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// First position of every node in a flattened list.
fn positions(nodes: &[NodeId]) -> HashMap<NodeId, u32> {
    let mut map = HashMap::with_capacity(nodes.len());
    for (i, &id) in nodes.iter().enumerate() {
        map.entry(id).or_insert_with(|| u32::try_from(i).unwrap_or(u32::MAX));
    }
    map
}

fn renumber(dlg: &mut Dlg, entries: &[NodeId], replies: &[NodeId]) {
    for list in [entries, replies] {
        for (i, &id) in list.iter().enumerate() {
            let data = dlg[id].data_mut();
            data.list_index = to_i32(i);
            sort_links(&mut data.links);
        }
    }
    sort_links(&mut dlg.starters);
}

fn sort_links(links: &mut [DlgLink]) {
    links.sort_by_key(|link| (link.list_index == -1, link.list_index));
    let mut position = 0;
    for link in links {
        if link.node.is_some() {
            link.list_index = to_i32(position);
            position += 1;
        } else {
            link.list_index = -1;
        }
    }
}

fn write_root(root: &mut GffStruct, dlg: &Dlg, options: &DismantleOptions) {
    root.set_uint32("NumWords", dlg.word_count);
    root.set_resref("EndConverAbort", dlg.on_abort.clone());
    root.set_resref("EndConversation", dlg.on_end.clone());
    root.set_uint8("Skippable", u8::from(dlg.skippable));
    if !dlg.ambient_track.is_blank() {
        root.set_resref("AmbientTrack", dlg.ambient_track.clone());
    }
    if dlg.animated_cut {
        root.set_uint8("AnimatedCut", 1);
    }
    root.set_resref("CameraModel", dlg.camera_model.clone());
    if dlg.computer_type != ComputerType::Modern {
        root.set_uint8("ComputerType", dlg.computer_type.id());
    }
    if dlg.conversation_type != ConversationType::Human {
        root.set_int32("ConversationType", dlg.conversation_type.id());
    }
    if dlg.old_hit_check {
        root.set_uint8("OldHitCheck", 1);
    }
    if dlg.unequip_hands {
        root.set_uint8("UnequipHItem", 1);
    }
    if dlg.unequip_items {
        root.set_uint8("UnequipItems", 1);
    }
    root.set_string("VO_ID", dlg.vo_id.as_str());

    if options.game.is_k2() {
        root.set_int32("AlienRaceOwner", dlg.alien_race_owner);
        root.set_int32("PostProcOwner", dlg.post_proc_owner);
        root.set_uint8("RecordNoVO", u8::from(dlg.record_no_vo));
        root.set_int32("NextNodeID", dlg.next_node_id);
    }

    if options.use_deprecated {
        root.set_uint32("DelayEntry", dlg.delay_entry);
        root.set_uint32("DelayReply", dlg.delay_reply);
    }
}

fn write_node(gff_struct: &mut GffStruct, node: &NodeData, k2: bool) {
    gff_struct.set_locstring("Text", node.text.clone());
    gff_struct.set_string("Listener", node.listener.as_str());
    gff_struct.set_resref("VO_ResRef", node.vo_resref.clone());
    gff_struct.set_resref("Script", node.script1.clone());
    gff_struct.set_uint32("Delay", u32::try_from(node.delay).unwrap_or(DELAY_DEFAULT));
    gff_struct.set_string("Comment", node.comment.as_str());
    gff_struct.set_resref("Sound", node.sound.clone());
    gff_struct.set_string("Quest", node.quest.as_str());
    gff_struct.set_int32("PlotIndex", node.plot_index);
    if node.plot_xp_percentage != 0.0 {
        gff_struct.set_single("PlotXPPercentage", node.plot_xp_percentage);
    }
    gff_struct.set_uint32("WaitFlags", node.wait_flags);
    gff_struct.set_uint32("CameraAngle", node.camera_angle);
    gff_struct.set_uint8("FadeType", node.fade_type);
    gff_struct.set_uint8("SoundExists", u8::from(node.sound_exists));

    if let Some(entry) = node.quest_entry.filter(|&entry| entry != 0 && !node.quest.trim().is_empty()) {
        gff_struct.set_uint32("QuestEntry", entry);
    }
    if let Some(delay) = node.fade_delay {
        gff_struct.set_single("FadeDelay", delay);
    }
    if let Some(length) = node.fade_length {
        gff_struct.set_single("FadeLength", length);
    }
    if let Some(color) = node.fade_color {
        gff_struct.set_vector3("FadeColor", color.bgr_vector3());
    }
    if let Some(camera_id) = node.camera_id {
        gff_struct.set_int32("CameraID", camera_id);
    }
    if let Some(anim) = node.camera_anim {
        gff_struct.set_uint16("CameraAnimation", anim);
    }
    if let Some(effect) = node.camera_effect {
        gff_struct.set_int32("CamVidEffect", effect);
    }
    if let Some(fov) = node.camera_fov {
        gff_struct.set_single("CamFieldOfView", fov);
    }
    if let Some(height) = node.camera_height {
        gff_struct.set_single("CamHeightOffset", height);
    }
    if let Some(height) = node.target_height {
        gff_struct.set_single("TarHeightOffset", height);
    }

    let anim_list = gff_struct.set_list("AnimList", GffList::new());
    for anim in &node.animations {
        let anim_struct = anim_list.add(0);
        anim_struct.set_uint16("Animation", anim.animation_id);
        anim_struct.set_string("Participant", anim.participant.as_str());
    }

    if k2 {
        for (n, (first, second)) in node.script1_params.iter().zip(&node.script2_params).enumerate() {
            gff_struct.set_int32(format!("ActionParam{}", n + 1), *first);
            gff_struct.set_int32(format!("ActionParam{}b", n + 1), *second);
        }
        gff_struct.set_string("ActionParamStrA", node.script1_param_str.as_str());
        gff_struct.set_string("ActionParamStrB", node.script2_param_str.as_str());
        gff_struct.set_resref("Script2", node.script2.clone());
        gff_struct.set_int32("AlienRaceNode", node.alien_race_node);
        gff_struct.set_int32("Emotion", node.emotion_id);
        gff_struct.set_int32("FacialAnim", node.facial_id);
        gff_struct.set_int32("NodeID", node.node_id);
        gff_struct.set_uint8("NodeUnskippable", u8::from(node.unskippable));
        gff_struct.set_int32("PostProcNode", node.post_proc_node);
        gff_struct.set_uint8("RecordNoVOOverri", u8::from(node.record_no_vo_override));
        gff_struct.set_uint8("RecordVO", u8::from(node.record_vo));
        gff_struct.set_uint8("VOTextChanged", u8::from(node.vo_text_changed));
    }
}

fn write_links(
    parent: &mut GffStruct,
    label: &str,
    links: &[DlgLink],
    targets: &HashMap<NodeId, u32>,
    k2: bool,
    node_list: bool,
) {
    let list = parent.set_list(label, GffList::new());
    for link in links {
        let Some(target) = link.node else {
            tracing::warn!("Skipping a {label} link with no target node");
            continue;
        };
        let Some(&index) = targets.get(&target) else {
            panic!("{label} link points at a node outside the list it indexes");
        };

        let link_struct = list.add(to_i32(list.len()));
        link_struct.set_uint32("Index", index);
        link_struct.set_resref("Active", link.active1.clone());
        if k2 {
            link_struct.set_resref("Active2", link.active2.clone());
            link_struct.set_int32("Logic", i32::from(link.logic));
            link_struct.set_uint8("Not", u8::from(link.active1_not));
            link_struct.set_uint8("Not2", u8::from(link.active2_not));
            for (n, (first, second)) in link.active1_params.iter().zip(&link.active2_params).enumerate() {
                link_struct.set_int32(format!("Param{}", n + 1), *first);
                link_struct.set_int32(format!("Param{}b", n + 1), *second);
            }
            link_struct.set_string("ParamStrA", link.active1_param_str.as_str());
            link_struct.set_string("ParamStrB", link.active2_param_str.as_str());
        }
        if node_list {
            link_struct.set_uint8("IsChild", u8::from(link.is_child));
            if !link.comment.is_empty() {
                link_struct.set_string("LinkComment", link.comment.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::construct::construct_dlg;
    use crate::dialog::types::{DlgAnimation, DlgEntry, DlgReply, DlgStunt};
    use crate::formats::common::{Color, LocalizedString, ResRef};
    use crate::formats::gff::{parse_gff_bytes, serialize_gff};
    use pretty_assertions::assert_eq;

    fn sample() -> Dlg {
        let mut dlg = Dlg::new();
        dlg.word_count = 42;
        dlg.on_end = ResRef::new("k_end");
        dlg.skippable = true;
        dlg.conversation_type = ConversationType::Computer;
        dlg.alien_race_owner = 3;
        dlg.delay_reply = 9;
        dlg.stunts.push(DlgStunt {
            participant: "carth".into(),
            stunt_model: ResRef::new("stunt01"),
        });

        let mut greeting = DlgEntry {
            speaker: "carth".into(),
            ..DlgEntry::default()
        };
        greeting.base.text = LocalizedString::from_english("Hello");
        greeting.base.fade_color = Some(Color::rgb(1.0, 0.5, 0.0));
        greeting.base.camera_anim = Some(1200);
        greeting.base.quest = "tar_main".into();
        greeting.base.quest_entry = Some(10);
        greeting.base.emotion_id = 4;
        greeting.base.animations.push(DlgAnimation {
            animation_id: 28,
            participant: "carth".into(),
        });

        let e0 = dlg.add_entry(greeting);
        let e1 = dlg.add_entry(DlgEntry::default());
        let r0 = dlg.add_reply(DlgReply::default());
        let r1 = dlg.add_reply(DlgReply::default());

        dlg.add_starter(e0).active1 = ResRef::new("k_cond");
        dlg.connect(e0, r0);
        dlg.connect(e0, r1).comment = "leave".into();
        dlg.connect(r0, e1);
        let back = dlg.connect(e1, r0);
        back.is_child = true;
        back.logic = true;
        back.active2_params[4] = 7;
        dlg
    }

    fn reparse(gff: &Gff) -> Gff {
        parse_gff_bytes(&serialize_gff(gff).unwrap()).unwrap()
    }

    #[test]
    fn test_root_policy() {
        let mut dlg = sample();
        let gff = dismantle_dlg(&mut dlg, Game::K1, false);
        let root = &gff.root;
        assert_eq!(gff.content, GffContent::Dlg);
        assert_eq!(root.acquire::<u32>("NumWords", 0), 42);
        assert!(root.exists("VO_ID"));
        assert!(root.exists("CameraModel"));
        assert!(!root.exists("AmbientTrack"));
        assert!(!root.exists("ComputerType"));
        assert_eq!(root.acquire::<i32>("ConversationType", 0), 1);
        assert!(!root.exists("AlienRaceOwner"));
        assert!(!root.exists("DelayReply"));

        let gff = dismantle_dlg(&mut dlg, Game::K2, true);
        assert_eq!(gff.root.acquire::<i32>("AlienRaceOwner", 0), 3);
        assert_eq!(gff.root.acquire::<u32>("DelayReply", 0), 9);
    }

    #[test]
    fn test_node_policy() {
        let mut dlg = sample();
        let gff = dismantle_dlg(&mut dlg, Game::K1, true);
        let entries = gff.root.get_list("EntryList").unwrap();
        let first = entries.at(0).unwrap();
        assert_eq!(first.acquire::<u32>("QuestEntry", 0), 10);
        assert!(first.exists("FadeColor"));
        assert!(!first.exists("FadeDelay"));
        assert!(!first.exists("PlotXPPercentage"));
        assert!(!first.exists("Emotion"));
        assert_eq!(first.acquire::<u32>("Delay", 0), DELAY_DEFAULT);
        assert_eq!(first.get_list("AnimList").unwrap().at(0).unwrap().struct_id, 0);

        let second = entries.at(1).unwrap();
        assert!(!second.exists("QuestEntry"));
        assert!(!second.exists("FadeColor"));
    }

    #[test]
    fn test_blank_quest_drops_quest_entry() {
        let mut dlg = sample();
        let e0 = dlg.starters[0].node.unwrap();
        dlg[e0].data_mut().quest = "   ".into();
        dlg[e0].data_mut().quest_entry = Some(5);
        let gff = dismantle_dlg(&mut dlg, Game::K2, true);
        let first = gff.root.get_list("EntryList").unwrap().at(0).unwrap();
        assert!(!first.exists("QuestEntry"));
    }

    #[test]
    fn test_link_policy() {
        let mut dlg = sample();
        let gff = dismantle_dlg(&mut dlg, Game::K1, true);
        let starter = gff.root.get_list("StartingList").unwrap().at(0).unwrap();
        assert!(!starter.exists("IsChild"));
        assert!(!starter.exists("Active2"));

        let replies_list = gff.root.get_list("EntryList").unwrap().at(0).unwrap().get_list("RepliesList").unwrap();
        assert_eq!(replies_list.len(), 2);
        assert!(!replies_list.at(0).unwrap().exists("LinkComment"));
        assert_eq!(replies_list.at(1).unwrap().acquire("LinkComment", String::new()), "leave");
        assert_eq!(replies_list.at(1).unwrap().struct_id, 1);

        let gff = dismantle_dlg(&mut dlg, Game::K2, true);
        let back = gff.root.get_list("EntryList").unwrap().at(1).unwrap().get_list("RepliesList").unwrap().at(0).unwrap();
        assert_eq!(back.acquire::<i32>("Logic", 0), 1);
        assert_eq!(back.acquire::<i32>("Param5b", 0), 7);
        assert_eq!(back.acquire::<u8>("IsChild", 0), 1);
    }

    #[test]
    fn test_round_trip_preserves_topology() {
        let mut dlg = sample();
        let gff = reparse(&dismantle_dlg(&mut dlg, Game::K2, true));
        let mut rebuilt = construct_dlg(&gff);

        assert_eq!(rebuilt.all_entries().len(), 2);
        assert_eq!(rebuilt.all_replies().len(), 2);
        assert_eq!(rebuilt.starters[0].active1, ResRef::new("k_cond"));
        assert_eq!(rebuilt.stunts, dlg.stunts);
        assert_eq!(rebuilt.word_count, 42);

        let e0 = rebuilt.starters[0].node.unwrap();
        let original_e0 = dlg.starters[0].node.unwrap();
        assert_eq!(rebuilt[e0].speaker(), Some("carth"));
        assert_eq!(rebuilt[e0].data().fade_color, dlg[original_e0].data().fade_color);
        assert_eq!(rebuilt[e0].data().camera_anim, Some(1200));
        assert_eq!(rebuilt[e0].data().emotion_id, 4);
        assert_eq!(rebuilt[e0].data().animations, dlg[original_e0].data().animations);

        // E0 -> R0 -> E1 -> R0 closes back on the same reply
        let r0 = rebuilt[e0].links()[0].node.unwrap();
        let e1 = rebuilt[r0].links()[0].node.unwrap();
        assert_eq!(rebuilt[e1].links()[0].node, Some(r0));
        assert!(rebuilt[e1].links()[0].is_child);

        // A second pass produces the same tree
        let again = dismantle_dlg(&mut rebuilt, Game::K2, true);
        assert_eq!(serialize_gff(&again).unwrap(), serialize_gff(&gff).unwrap());
    }

    #[test]
    fn test_list_indices_reassigned() {
        let mut dlg = sample();
        let orphan = dlg.add_entry(DlgEntry::default());
        let _ = dismantle_dlg(&mut dlg, Game::K1, true);
        let entries = dlg.all_entries();
        for (i, id) in entries.iter().enumerate() {
            assert_eq!(dlg[*id].data().list_index, i32::try_from(i).unwrap());
        }
        assert_eq!(dlg[orphan].data().list_index, -1);
        assert_eq!(dlg.starters[0].list_index, 0);
    }

    #[test]
    fn test_links_sorted_by_list_index() {
        let mut dlg = sample();
        let e0 = dlg.starters[0].node.unwrap();
        let r1 = dlg[e0].links()[1].node.unwrap();
        dlg[e0].data_mut().links[0].list_index = 1;
        dlg[e0].data_mut().links[1].list_index = 0;

        let _ = dismantle_dlg(&mut dlg, Game::K1, true);
        assert_eq!(dlg[e0].links()[0].node, Some(r1));
        assert_eq!(dlg[e0].links()[0].list_index, 0);
    }

    #[test]
    fn test_targetless_link_skipped() {
        let mut dlg = sample();
        let e0 = dlg.starters[0].node.unwrap();
        dlg[e0].data_mut().links.push(DlgLink::new(None));
        let gff = dismantle_dlg(&mut dlg, Game::K1, true);
        let replies_list = gff.root.get_list("EntryList").unwrap().at(0).unwrap().get_list("RepliesList").unwrap();
        assert_eq!(replies_list.len(), 2);
        assert_eq!(dlg[e0].links().last().unwrap().list_index, -1);
    }

    #[test]
    fn test_targetless_link_loses_stale_index() {
        let mut dlg = sample();
        let e0 = dlg.starters[0].node.unwrap();
        let mut stale = DlgLink::new(None);
        stale.list_index = 0;
        dlg[e0].data_mut().links.insert(0, stale);
        let _ = dismantle_dlg(&mut dlg, Game::K1, true);

        let indices: Vec<i32> = dlg[e0].links().iter().map(|link| link.list_index).collect();
        assert_eq!(indices.iter().filter(|&&index| index == -1).count(), 1);
        assert!(indices.contains(&0) && indices.contains(&1));
    }

    #[test]
    #[should_panic(expected = "outside the list it indexes")]
    fn test_wrong_kind_target_panics() {
        let mut dlg = sample();
        let e0 = dlg.starters[0].node.unwrap();
        dlg[e0].data_mut().links[0].node = Some(e0);
        let _ = dismantle_dlg(&mut dlg, Game::K1, true);
    }
}
