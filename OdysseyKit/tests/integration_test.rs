use odysseykit::dialog::{DlgPathTarget, DlgTarget};
use odysseykit::formats::gff::{GffList, bytes_gff, parse_gff};
use odysseykit::prelude::*;
use pretty_assertions::assert_eq;
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

/// Builds a talk table from `(text, sound)` pairs.
fn build_tlk(entries: &[(&str, &str)]) -> Vec<u8> {
    let count = u32::try_from(entries.len()).unwrap();
    let mut data = Vec::new();
    data.extend_from_slice(b"TLK V3.0");
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&count.to_le_bytes());
    data.extend_from_slice(&(20 + count * 40).to_le_bytes());

    let mut texts = Vec::new();
    for (text, sound) in entries {
        data.extend_from_slice(&TlkEntry::TEXT_PRESENT.to_le_bytes());
        let mut raw_sound = [0u8; 16];
        raw_sound[..sound.len()].copy_from_slice(sound.as_bytes());
        data.extend_from_slice(&raw_sound);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&u32::try_from(texts.len()).unwrap().to_le_bytes());
        data.extend_from_slice(&u32::try_from(text.len()).unwrap().to_le_bytes());
        data.extend_from_slice(&0.0f32.to_le_bytes());
        texts.extend_from_slice(text.as_bytes());
    }
    data.extend_from_slice(&texts);
    data
}

/// A conversation where two replies converge on one entry and a reply
/// loops back to the opening line.
fn tavern() -> Dlg {
    let mut dlg = Dlg::new();
    dlg.word_count = 31;
    dlg.on_end = ResRef::new("k_tav_end");

    let mut greeting = DlgEntry {
        speaker: "barkeep".into(),
        ..DlgEntry::default()
    };
    greeting.base.text = LocalizedString::from_english("What'll it be?");
    greeting.base.vo_resref = ResRef::new("tav_bark_01");
    let greeting = dlg.add_entry(greeting);

    let mut farewell = DlgEntry::default();
    farewell.base.text = LocalizedString::new(42_117);
    let farewell = dlg.add_entry(farewell);

    let ale = dlg.add_reply(DlgReply::default());
    let nothing = dlg.add_reply(DlgReply::default());
    let again = dlg.add_reply(DlgReply::default());

    dlg.add_starter(greeting);
    dlg.connect(greeting, ale);
    dlg.connect(greeting, nothing);
    dlg.connect(ale, farewell);
    dlg.connect(nothing, farewell);
    dlg.connect(farewell, again);
    dlg.connect(again, greeting).is_child = true;
    dlg
}

#[test]
fn test_gff_file_round_trip_both_encodings() {
    let dir = tempdir().unwrap();
    let mut gff = Gff::new(GffContent::Uti);
    gff.root.set_resref("TemplateResRef", "g_w_lghtsbr01");
    gff.root.set_locstring("LocalizedName", LocalizedString::new(5_326));
    gff.root.set_uint32("Cost", 5_000);
    let properties = gff.root.set_list("PropertiesList", GffList::new());
    properties.add(0).set_uint16("PropertyName", 11);

    for format in [ResourceFormat::Gff, ResourceFormat::GffXml] {
        let path = dir.path().join(format!("item.{format}"));
        write_gff(&gff, &path, format).unwrap();
        assert_eq!(read_gff(&path).unwrap(), gff);
    }
}

#[test]
fn test_dlg_round_trip_preserves_topology() {
    let mut original = tavern();
    let data = bytes_gff(&dismantle_dlg(&mut original, Game::K1, true), ResourceFormat::Gff).unwrap();
    let rebuilt = construct_dlg(&parse_gff(&data).unwrap());

    assert_eq!(rebuilt.all_entries().len(), 2);
    assert_eq!(rebuilt.all_replies().len(), 3);
    assert_eq!(rebuilt.word_count, 31);
    assert_eq!(rebuilt.on_end, ResRef::new("k_tav_end"));

    let greeting = rebuilt.starters[0].node.unwrap();
    assert_eq!(rebuilt[greeting].speaker(), Some("barkeep"));
    assert_eq!(rebuilt[greeting].data().vo_resref, ResRef::new("tav_bark_01"));

    // Both replies lead to the very same farewell node
    let ale = rebuilt[greeting].links()[0].node.unwrap();
    let nothing = rebuilt[greeting].links()[1].node.unwrap();
    let farewell = rebuilt[ale].links()[0].node.unwrap();
    assert_eq!(rebuilt[nothing].links()[0].node, Some(farewell));
    assert_eq!(rebuilt[farewell].data().text.stringref, 42_117);

    // And the loop closes on the opening line
    let again = rebuilt[farewell].links()[0].node.unwrap();
    assert_eq!(rebuilt[again].links()[0].node, Some(greeting));
    assert!(rebuilt[again].links()[0].is_child);
}

#[test]
fn test_dangling_indices_are_logged_and_dropped() {
    let mut gff = Gff::new(GffContent::Dlg);
    let entries = gff.root.set_list("EntryList", GffList::new());
    let replies_list = entries.add(0).set_list("RepliesList", GffList::new());
    replies_list.add(0).set_uint32("Index", 5);
    gff.root.set_list("ReplyList", GffList::new());
    let starting = gff.root.set_list("StartingList", GffList::new());
    starting.add(0).set_uint32("Index", 0);
    starting.add(1).set_uint32("Index", 3);

    let (dlg, logs) = capture_logs(|| construct_dlg(&gff));

    assert_eq!(dlg.starters.len(), 1);
    let entry = dlg.starters[0].node.unwrap();
    assert!(dlg[entry].links().is_empty());
    assert!(logs.contains("StartingList/1"), "{logs}");
    assert!(logs.contains("EntryList/0/RepliesList/0"), "{logs}");
    assert!(logs.contains("ERROR"), "{logs}");
}

#[test]
fn test_paths_and_lookup() {
    let dlg = tavern();
    let entries = dlg.all_entries();
    let farewell = entries[1];

    let paths = dlg.find_paths(DlgTarget::Node(farewell));
    assert_eq!(paths, vec!["ReplyList/0/EntriesList/0", "ReplyList/2/EntriesList/0"]);
    for path in &paths {
        assert!(matches!(dlg.lookup_from_path(path), Some(DlgPathTarget::Link(link)) if link.node == Some(farewell)));
    }
    assert!(dlg.lookup_from_path("ReplyList/7").is_none());
}

#[test]
fn test_print_tree_terminates_on_cycles() {
    let tree = tavern().print_tree();
    assert!(tree.starts_with("[Entry] barkeep: What'll it be?\n"));
    assert!(tree.contains("(see above)"));
}

#[test]
fn test_dlg_json_snapshot_round_trip() {
    let original = tavern();
    let text = original.to_json_string().unwrap();
    let rebuilt = Dlg::from_json_str(&text).unwrap();

    assert_eq!(rebuilt.node_count(), original.node_count());
    assert_eq!(rebuilt.print_tree(), original.print_tree());
}

#[test]
fn test_ssf_file_round_trip() {
    let dir = tempdir().unwrap();
    let mut ssf = Ssf::new();
    ssf.set(SsfSound::BATTLE_CRY_1, 123);
    ssf.set(SsfSound::REJOINED_PARTY, 456);

    let binary = dir.path().join("test.ssf");
    write_ssf(&ssf, &binary, ResourceFormat::Ssf).unwrap();
    assert_eq!(std::fs::metadata(&binary).unwrap().len(), 156);
    assert_eq!(read_ssf(&binary).unwrap(), ssf);

    let xml = dir.path().join("test.ssf.xml");
    write_ssf(&ssf, &xml, ResourceFormat::SsfXml).unwrap();
    assert_eq!(read_ssf(&xml).unwrap(), ssf);
}

#[test]
fn test_tlk_file_lookups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.tlk");
    std::fs::write(
        &path,
        build_tlk(&[("abcdef", "resref01"), ("ghijklmnop", "resref02"), ("qrstuvwxyz", "")]),
    )
    .unwrap();

    let tlk = TalkTable::new(&path);
    assert_eq!(tlk.size().unwrap(), 3);
    assert_eq!(tlk.string(1).unwrap(), "ghijklmnop");
    assert_eq!(tlk.sound(0).unwrap(), ResRef::new("resref01"));
    assert_eq!(tlk.string(3).unwrap(), "");
    assert_eq!(tlk.string(-1).unwrap(), "");

    let batch = tlk.batch(&[0, 2, 9]).unwrap();
    assert_eq!(batch[&0], ("abcdef".to_string(), ResRef::new("resref01")));
    assert_eq!(batch[&2], ("qrstuvwxyz".to_string(), ResRef::blank()));
    assert_eq!(batch[&9], (String::new(), ResRef::blank()));

    // Every lookup reopens the file
    std::fs::write(&path, build_tlk(&[("replaced", "")])).unwrap();
    assert_eq!(tlk.size().unwrap(), 1);
    assert_eq!(tlk.string(0).unwrap(), "replaced");
}

#[test]
fn test_converter_detects_and_flips() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("test.ssf");
    let xml = dir.path().join("test.xml");
    let mut ssf = Ssf::new();
    ssf.set(SsfSound::DEAD, 7);
    write_ssf(&ssf, &source, ResourceFormat::Ssf).unwrap();

    let detected = converter::convert_resource(&source, &xml, None).unwrap();
    assert_eq!(detected, ResourceFormat::Ssf);
    assert_eq!(converter::detect_resource(&std::fs::read(&xml).unwrap()), ResourceFormat::SsfXml);
}

#[test]
fn test_dlg_json_repeated_link_keeps_target() {
    let mut snapshot = tavern().to_json().unwrap();
    let key = snapshot["starters"][0]["key"].clone();
    snapshot["starters"].as_array_mut().unwrap().push(serde_json::json!({"type": "DLGLink", "ref": key}));

    let rebuilt = Dlg::from_json(&snapshot).unwrap();
    assert_eq!(rebuilt.starters.len(), 2);
    assert_eq!(rebuilt.starters[1].node, rebuilt.starters[0].node);
    assert!(rebuilt.starters[1].node.is_some());
}

#[test]
fn test_blank_quest_is_not_written() {
    let mut dlg = tavern();
    let greeting = dlg.starters[0].node.unwrap();
    dlg[greeting].data_mut().quest = " \t".into();
    dlg[greeting].data_mut().quest_entry = Some(3);

    let gff = dismantle_dlg(&mut dlg, Game::K2, false);
    let entry = gff.root.get_list("EntryList").unwrap().at(0).unwrap();
    assert!(!entry.exists("QuestEntry"));
}
