//! Round-trip tests across staging, packing and unpacking

use super::common::machine::{tree, Machine};
use bwsave::backup::archiver::{self, ExistingArchive};
use bwsave::backup::stager::{self, StageItem};
use bwsave::backup::{BackupOrchestrator, Consent, RestoreOrchestrator, Workspace};
use bwsave::prompt::ScriptedPrompt;
use bwsave::registry::{encode_profile_marker, RegData};
use pretty_assertions::assert_eq;

#[test]
fn test_stage_pack_unpack_reproduces_tree() {
    let machine = Machine::new();
    machine.install_profile(
        "Save1",
        "M1.mind",
        &[
            ("a.dat", b"alpha"),
            ("Land1/b.dat", b"beta"),
            ("Land1/Deep/c.dat", b"gamma"),
        ],
        b"t",
    );
    let items = vec![
        StageItem::dir("Save1", machine.profile_dir("Save1")),
        StageItem::file("M1.mind", machine.creature_file("M1.mind")),
        StageItem::file("M1.phy", machine.creature_file("M1.phy")),
    ];
    let archive = machine.dir.path().join("rt.zip");

    let staged = {
        let ws = Workspace::create(machine.dir.path().join("ws_in")).unwrap();
        stager::stage_in(&items, &ws).unwrap();
        archiver::pack(&ws, &archive, ExistingArchive::Refuse).unwrap();
        let staged = tree(ws.path());
        ws.destroy().unwrap();
        staged
    };

    let ws = Workspace::create(machine.dir.path().join("ws_out")).unwrap();
    archiver::unpack(&archive, &ws).unwrap();
    assert_eq!(tree(ws.path()), staged);

    // Copy back out onto a second machine with the same layout
    let other = Machine::new();
    let out_items: Vec<StageItem> = items
        .iter()
        .map(|item| {
            let rel = item.live.strip_prefix(machine.game_dir()).unwrap();
            StageItem {
                live: other.game_dir().join(rel),
                ..item.clone()
            }
        })
        .collect();
    stager::stage_out(&out_items, &ws).unwrap();
    assert_eq!(tree(&other.game_dir()), tree(&machine.game_dir()));
}

#[test]
fn test_backup_then_restore_on_another_machine() {
    let source = Machine::new();
    source.install_profile("My_Save", "Creature.mind", &[("x.dat", b"x")], b"s");
    let locator = source.locator();
    let profile = locator.resolve_profile("My_Save").unwrap();
    BackupOrchestrator::new(&locator, &source.messages, Consent::Ask)
        .run(&profile, &source.out_dir(), &mut ScriptedPrompt::new(Vec::<String>::new()))
        .unwrap();

    let target = Machine::new();
    let target_locator = target.locator();
    RestoreOrchestrator::new(&target_locator, &target.messages, Consent::Ask)
        .run(
            &source.out_dir().join("My_Save.zip"),
            &mut ScriptedPrompt::new(Vec::<String>::new()),
        )
        .unwrap();

    assert_eq!(tree(&target.game_dir()), tree(&source.game_dir()));

    let key = target_locator.profile_key("My_Save");
    assert_eq!(
        target.registry.value(&key, "CreatureMind"),
        Some(RegData::String("Creature.mind".into()))
    );
    assert_eq!(
        target.registry.value(&key.join("Stats"), "Level"),
        Some(RegData::Binary(b"s".to_vec()))
    );
    assert_eq!(
        target
            .registry
            .value(&target_locator.profiles_base_key(), "LastProfile"),
        Some(RegData::Binary(encode_profile_marker("My_Save")))
    );
}
