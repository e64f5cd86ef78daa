//! JSON snapshots of a conversation graph
//!
//! ```text
//! {"starters": [link], "stunts": [...], "word_count": 12, ...}
//! link: {"type": "DLGLink", "key": 7, "link_list_index": 0, "node": node | null, "data": {...}}
//! node: {"type": "DLGEntry" | "DLGReply", "key": 9, "data": {...}}
//!       {"ref": 9}   once the node has been written
//! link: {"type": "DLGLink", "ref": 7}   once the link has been written
//! ```
//!
//! Node and link fields are written as `{"value": .., "py_type": ..}` pairs.
//! A node or link reached a second time is replaced by a `ref` stub, so shared
//! nodes and cycles survive a round trip.

use super::types::{ComputerType, ConversationType, Dlg, DlgEntry, DlgLink, DlgNode, DlgReply, NodeData, NodeId};
use crate::error::{Error, Result};
use crate::formats::common::LocalizedString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};

impl Dlg {
    /// Snapshot the reachable graph and the conversation fields as JSON.
    ///
    /// # Errors
    /// Returns [`Error::JsonError`] if a field cannot be represented.
    pub fn to_json(&self) -> Result<Value> {
        let mut writer = SnapshotWriter {
            dlg: self,
            written: HashSet::new(),
            written_links: HashSet::new(),
        };
        let starters = self
            .starters
            .iter()
            .map(|link| writer.link(link))
            .collect::<Result<Vec<_>>>()?;

        Ok(json!({
            "starters": starters,
            "stunts": serde_json::to_value(&self.stunts)?,
            "word_count": self.word_count,
            "on_abort": self.on_abort,
            "on_end": self.on_end,
            "skippable": self.skippable,
            "ambient_track": self.ambient_track,
            "animated_cut": self.animated_cut,
            "camera_model": self.camera_model,
            "computer_type": self.computer_type.id(),
            "conversation_type": self.conversation_type.id(),
            "old_hit_check": self.old_hit_check,
            "unequip_hands": self.unequip_hands,
            "unequip_items": self.unequip_items,
            "vo_id": self.vo_id,
            "alien_race_owner": self.alien_race_owner,
            "post_proc_owner": self.post_proc_owner,
            "record_no_vo": self.record_no_vo,
            "next_node_id": self.next_node_id,
            "delay_entry": self.delay_entry,
            "delay_reply": self.delay_reply,
        }))
    }

    /// [`Dlg::to_json`] rendered as pretty-printed text.
    ///
    /// # Errors
    /// Returns [`Error::JsonError`] if a field cannot be represented.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }

    /// Rebuild a conversation from a snapshot made by [`Dlg::to_json`].
    ///
    /// Nodes and links get fresh identities; topology is preserved.
    /// Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSnapshot`] for an unknown object type or a
    /// `ref` to a node or link that has not been defined, or [`Error::JsonError`]
    /// for a field of the wrong JSON type.
    pub fn from_json(value: &Value) -> Result<Dlg> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::InvalidSnapshot("the snapshot root must be an object".into()))?;

        let mut dlg = Dlg::new();
        dlg.word_count = plain(root, "word_count")?;
        dlg.on_abort = plain(root, "on_abort")?;
        dlg.on_end = plain(root, "on_end")?;
        dlg.skippable = plain(root, "skippable")?;
        dlg.ambient_track = plain(root, "ambient_track")?;
        dlg.animated_cut = plain(root, "animated_cut")?;
        dlg.camera_model = plain(root, "camera_model")?;
        dlg.computer_type = ComputerType::from_id(plain(root, "computer_type")?);
        dlg.conversation_type = ConversationType::from_id(plain(root, "conversation_type")?);
        dlg.old_hit_check = plain(root, "old_hit_check")?;
        dlg.unequip_hands = plain(root, "unequip_hands")?;
        dlg.unequip_items = plain(root, "unequip_items")?;
        dlg.vo_id = plain(root, "vo_id")?;
        dlg.alien_race_owner = plain(root, "alien_race_owner")?;
        dlg.post_proc_owner = plain(root, "post_proc_owner")?;
        dlg.record_no_vo = plain(root, "record_no_vo")?;
        dlg.next_node_id = plain(root, "next_node_id")?;
        dlg.delay_entry = plain(root, "delay_entry")?;
        dlg.delay_reply = plain(root, "delay_reply")?;
        dlg.stunts = plain(root, "stunts")?;

        let mut reader = SnapshotReader {
            dlg: &mut dlg,
            nodes: HashMap::new(),
            links: HashMap::new(),
        };
        let mut starters = Vec::new();
        for link in root.get("starters").and_then(Value::as_array).into_iter().flatten() {
            starters.push(reader.link(link)?);
        }
        dlg.starters = starters;
        Ok(dlg)
    }

    /// Parse snapshot text produced by [`Dlg::to_json_string`].
    ///
    /// # Errors
    /// Same as [`Dlg::from_json`], plus [`Error::JsonError`] for malformed text.
    pub fn from_json_str(text: &str) -> Result<Dlg> {
        Self::from_json(&serde_json::from_str(text)?)
    }
}

/// A top-level field, or its default when absent.
fn plain<T: DeserializeOwned + Default>(map: &Map<String, Value>, name: &str) -> Result<T> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

/// Builds the `data` object of a node or link.
#[derive(Default)]
struct Fields(Map<String, Value>);

impl Fields {
    fn put<T: Serialize>(&mut self, name: &str, value: &T, py_type: &str) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let py_type = if value.is_null() { "None" } else { py_type };
        self.0
            .insert(name.to_string(), json!({ "value": value, "py_type": py_type }));
        Ok(())
    }

    fn raw(&mut self, name: &str, value: Value, py_type: &str) {
        self.0
            .insert(name.to_string(), json!({ "value": value, "py_type": py_type }));
    }
}

/// Reads the `data` object of a node or link.
struct FieldReader<'a>(Option<&'a Map<String, Value>>);

impl<'a> FieldReader<'a> {
    fn of(object: &'a Value) -> Self {
        FieldReader(object.get("data").and_then(Value::as_object))
    }

    fn value(&self, name: &str) -> Option<&'a Value> {
        self.0
            .and_then(|data| data.get(name))
            .and_then(|field| field.get("value"))
            .filter(|value| !value.is_null())
    }

    fn get<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        Ok(self.optional(name)?.unwrap_or_default())
    }

    fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.value(name) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn locstring(&self, name: &str) -> Result<LocalizedString> {
        let Some(value) = self.value(name) else {
            return Ok(LocalizedString::from_invalid());
        };
        let stringref = value.get("stringref").and_then(Value::as_i64).unwrap_or(-1);
        let mut locstring = LocalizedString::new(i32::try_from(stringref).unwrap_or(-1));
        for (id, text) in value.get("substrings").and_then(Value::as_object).into_iter().flatten() {
            let id: u32 = id
                .parse()
                .map_err(|_| Error::InvalidSnapshot(format!("bad substring id '{id}' in {name}")))?;
            let text = text
                .as_str()
                .ok_or_else(|| Error::InvalidSnapshot(format!("substring {id} of {name} is not text")))?;
            locstring.set_by_id(id, text);
        }
        Ok(locstring)
    }
}

fn locstring_value(locstring: &LocalizedString) -> Value {
    let substrings: Map<String, Value> = locstring
        .iter_ids()
        .map(|(id, text)| (id.to_string(), Value::from(text)))
        .collect();
    json!({ "stringref": locstring.stringref, "substrings": substrings })
}

struct SnapshotWriter<'a> {
    dlg: &'a Dlg,
    written: HashSet<NodeId>,
    written_links: HashSet<u64>,
}

impl SnapshotWriter<'_> {
    fn link(&mut self, link: &DlgLink) -> Result<Value> {
        if self.written_links.contains(&link.uid()) {
            return Ok(json!({ "type": "DLGLink", "ref": link.uid() }));
        }

        let node = match link.node {
            Some(id) => self.node(id)?,
            None => Value::Null,
        };
        // Registered after the target so a ref never precedes the readable copy
        self.written_links.insert(link.uid());

        let mut data = Fields::default();
        data.put("active1", &link.active1, "ResRef")?;
        data.put("active2", &link.active2, "ResRef")?;
        data.put("logic", &link.logic, "bool")?;
        data.put("active1_not", &link.active1_not, "bool")?;
        data.put("active2_not", &link.active2_not, "bool")?;
        data.put("active1_params", &link.active1_params, "list")?;
        data.put("active1_param_str", &link.active1_param_str, "str")?;
        data.put("active2_params", &link.active2_params, "list")?;
        data.put("active2_param_str", &link.active2_param_str, "str")?;
        data.put("is_child", &link.is_child, "bool")?;
        data.put("comment", &link.comment, "str")?;

        Ok(json!({
            "type": "DLGLink",
            "key": link.uid(),
            "link_list_index": link.list_index,
            "node": node,
            "data": data.0,
        }))
    }

    fn node(&mut self, id: NodeId) -> Result<Value> {
        let dlg = self.dlg;
        let node = &dlg[id];
        let key = node.data().uid();
        if !self.written.insert(id) {
            return Ok(json!({ "ref": key }));
        }

        let base = node.data();
        let mut data = Fields::default();
        if let Some(speaker) = node.speaker() {
            data.put("speaker", &speaker, "str")?;
        }
        data.put("list_index", &base.list_index, "int")?;
        data.put("comment", &base.comment, "str")?;
        data.put("camera_angle", &base.camera_angle, "int")?;
        data.put("camera_anim", &base.camera_anim, "int")?;
        data.put("camera_id", &base.camera_id, "int")?;
        data.put("camera_effect", &base.camera_effect, "int")?;
        data.put("camera_fov", &base.camera_fov, "float")?;
        data.put("camera_height", &base.camera_height, "float")?;
        data.put("target_height", &base.target_height, "float")?;
        data.put("delay", &base.delay, "int")?;
        data.put("fade_type", &base.fade_type, "int")?;
        data.put("fade_color", &base.fade_color, "Color")?;
        data.put("fade_delay", &base.fade_delay, "float")?;
        data.put("fade_length", &base.fade_length, "float")?;
        data.raw("text", locstring_value(&base.text), "LocalizedString");
        data.put("script1", &base.script1, "ResRef")?;
        data.put("script2", &base.script2, "ResRef")?;
        data.put("sound", &base.sound, "ResRef")?;
        data.put("sound_exists", &base.sound_exists, "bool")?;
        data.put("vo_resref", &base.vo_resref, "ResRef")?;
        data.put("wait_flags", &base.wait_flags, "int")?;
        data.put("animations", &base.animations, "list")?;
        data.put("quest", &base.quest, "str")?;
        data.put("quest_entry", &base.quest_entry, "int")?;
        data.put("plot_index", &base.plot_index, "int")?;
        data.put("plot_xp_percentage", &base.plot_xp_percentage, "float")?;
        data.put("listener", &base.listener, "str")?;
        data.put("script1_params", &base.script1_params, "list")?;
        data.put("script1_param_str", &base.script1_param_str, "str")?;
        data.put("script2_params", &base.script2_params, "list")?;
        data.put("script2_param_str", &base.script2_param_str, "str")?;
        data.put("alien_race_node", &base.alien_race_node, "int")?;
        data.put("emotion_id", &base.emotion_id, "int")?;
        data.put("facial_id", &base.facial_id, "int")?;
        data.put("node_id", &base.node_id, "int")?;
        data.put("unskippable", &base.unskippable, "bool")?;
        data.put("post_proc_node", &base.post_proc_node, "int")?;
        data.put("record_no_vo_override", &base.record_no_vo_override, "bool")?;
        data.put("record_vo", &base.record_vo, "bool")?;
        data.put("vo_text_changed", &base.vo_text_changed, "bool")?;

        let links = base
            .links
            .iter()
            .map(|link| self.link(link))
            .collect::<Result<Vec<_>>>()?;
        data.raw("links", Value::Array(links), "list");

        let kind = if node.is_entry() { "DLGEntry" } else { "DLGReply" };
        Ok(json!({ "type": kind, "key": key, "data": data.0 }))
    }
}

struct SnapshotReader<'a> {
    dlg: &'a mut Dlg,
    nodes: HashMap<u64, NodeId>,
    links: HashMap<u64, DlgLink>,
}

impl SnapshotReader<'_> {
    fn link(&mut self, value: &Value) -> Result<DlgLink> {
        match value.get("type").and_then(Value::as_str) {
            Some("DLGLink") => {}
            other => {
                return Err(Error::InvalidSnapshot(format!("expected a DLGLink, found {other:?}")));
            }
        }

        if let Some(key) = value.get("ref") {
            let key = key
                .as_u64()
                .ok_or_else(|| Error::InvalidSnapshot(format!("bad link reference {key}")))?;
            return self
                .links
                .get(&key)
                .map(DlgLink::share)
                .ok_or_else(|| Error::InvalidSnapshot(format!("reference to undefined link {key}")));
        }

        let node = match value.get("node") {
            None | Some(Value::Null) => None,
            Some(node) => Some(self.node(node)?),
        };

        let fields = FieldReader::of(value);
        let mut link = DlgLink::new(node);
        link.list_index = value
            .get("link_list_index")
            .and_then(Value::as_i64)
            .and_then(|index| i32::try_from(index).ok())
            .unwrap_or(-1);
        link.active1 = fields.get("active1")?;
        link.active2 = fields.get("active2")?;
        link.logic = fields.get("logic")?;
        link.active1_not = fields.get("active1_not")?;
        link.active2_not = fields.get("active2_not")?;
        link.active1_params = fields.get("active1_params")?;
        link.active1_param_str = fields.get("active1_param_str")?;
        link.active2_params = fields.get("active2_params")?;
        link.active2_param_str = fields.get("active2_param_str")?;
        link.is_child = fields.get("is_child")?;
        link.comment = fields.get("comment")?;
        if let Some(key) = value.get("key").and_then(Value::as_u64) {
            self.links.insert(key, link.share());
        }
        Ok(link)
    }

    fn node(&mut self, value: &Value) -> Result<NodeId> {
        if let Some(key) = value.get("ref") {
            let key = key
                .as_u64()
                .ok_or_else(|| Error::InvalidSnapshot(format!("bad node reference {key}")))?;
            return self
                .nodes
                .get(&key)
                .copied()
                .ok_or_else(|| Error::InvalidSnapshot(format!("reference to undefined node {key}")));
        }

        let id = match value.get("type").and_then(Value::as_str) {
            Some("DLGEntry") => self.dlg.add_entry(DlgEntry::default()),
            Some("DLGReply") => self.dlg.add_reply(DlgReply::default()),
            other => {
                return Err(Error::InvalidSnapshot(format!("expected a DLGEntry or DLGReply, found {other:?}")));
            }
        };
        // Registered before the links are read so cycles resolve to this node
        if let Some(key) = value.get("key").and_then(Value::as_u64) {
            self.nodes.insert(key, id);
        }

        let fields = FieldReader::of(value);
        let mut links = Vec::new();
        for link in fields.value("links").and_then(Value::as_array).into_iter().flatten() {
            links.push(self.link(link)?);
        }

        let mut base = read_node_data(&fields)?;
        base.links = links;
        match &mut self.dlg[id] {
            DlgNode::Entry(entry) => {
                entry.speaker = fields.get("speaker")?;
                entry.base = base;
            }
            DlgNode::Reply(reply) => reply.base = base,
        }
        Ok(id)
    }
}

fn read_node_data(fields: &FieldReader<'_>) -> Result<NodeData> {
    let mut base = NodeData::default();
    base.list_index = fields.get_or("list_index", -1)?;
    base.comment = fields.get("comment")?;
    base.camera_angle = fields.get("camera_angle")?;
    base.camera_anim = fields.optional("camera_anim")?;
    base.camera_id = fields.optional("camera_id")?;
    base.camera_effect = fields.optional("camera_effect")?;
    base.camera_fov = fields.optional("camera_fov")?;
    base.camera_height = fields.optional("camera_height")?;
    base.target_height = fields.optional("target_height")?;
    base.delay = fields.get_or("delay", -1)?;
    base.fade_type = fields.get("fade_type")?;
    base.fade_color = fields.optional("fade_color")?;
    base.fade_delay = fields.optional("fade_delay")?;
    base.fade_length = fields.optional("fade_length")?;
    base.text = fields.locstring("text")?;
    base.script1 = fields.get("script1")?;
    base.script2 = fields.get("script2")?;
    base.sound = fields.get("sound")?;
    base.sound_exists = fields.get("sound_exists")?;
    base.vo_resref = fields.get("vo_resref")?;
    base.wait_flags = fields.get("wait_flags")?;
    base.animations = fields.get("animations")?;
    base.quest = fields.get("quest")?;
    base.quest_entry = fields.optional("quest_entry")?;
    base.plot_index = fields.get_or("plot_index", -1)?;
    base.plot_xp_percentage = fields.get("plot_xp_percentage")?;
    base.listener = fields.get("listener")?;
    base.script1_params = fields.get("script1_params")?;
    base.script1_param_str = fields.get("script1_param_str")?;
    base.script2_params = fields.get("script2_params")?;
    base.script2_param_str = fields.get("script2_param_str")?;
    base.alien_race_node = fields.get("alien_race_node")?;
    base.emotion_id = fields.get("emotion_id")?;
    base.facial_id = fields.get("facial_id")?;
    base.node_id = fields.get("node_id")?;
    base.unskippable = fields.get("unskippable")?;
    base.post_proc_node = fields.get("post_proc_node")?;
    base.record_no_vo_override = fields.get("record_no_vo_override")?;
    base.record_vo = fields.get("record_vo")?;
    base.vo_text_changed = fields.get("vo_text_changed")?;
    Ok(base)
}
