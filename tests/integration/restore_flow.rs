//! Integration tests for the restore pipeline

use std::fs;
use std::path::PathBuf;

use super::common::machine::{displaced_leftovers, tree, Machine};
use bwsave::backup::archiver::{self, ExistingArchive};
use bwsave::backup::{
    BackupOrchestrator, Consent, Outcome, RestoreOrchestrator, StageId, Workspace,
};
use bwsave::models::Manifest;
use bwsave::prompt::ScriptedPrompt;
use bwsave::registry::{encode_profile_marker, MemoryRegistry, RegData, Registry};
use bwsave::SaveError;
use pretty_assertions::assert_eq;

/// Back up "Save1" on a fresh machine and return the archive with its owner
fn make_archive() -> (Machine, PathBuf) {
    let source = Machine::new();
    source.install_profile(
        "Save1",
        "M1.mind",
        &[("profile.dat", b"new profile"), ("Land1/town.dat", b"new town")],
        b"new",
    );
    let locator = source.locator();
    let profile = locator.resolve_profile("Save1").unwrap();
    let backup = BackupOrchestrator::new(&locator, &source.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    backup.run(&profile, &source.out_dir(), &mut prompt).unwrap();

    let archive = source.out_dir().join("Save1.zip");
    (source, archive)
}

#[test]
fn test_restore_into_empty_slot() {
    let (source, archive) = make_archive();
    let target = Machine::new();
    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

    let run = restore.run(&archive, &mut prompt).unwrap();

    assert_eq!(run.outcome, Outcome::Completed);
    assert!(prompt.asked.is_empty());
    assert!(prompt.said.contains(&target.messages.profile_clear));

    assert_eq!(
        tree(&target.profile_dir("Save1")),
        tree(&source.profile_dir("Save1"))
    );
    assert_eq!(
        fs::read(target.creature_file("M1.mind")).unwrap(),
        b"mind:new"
    );
    assert_eq!(fs::read(target.creature_file("M1.phy")).unwrap(), b"phy:new");

    let key = locator.profile_key("Save1");
    assert_eq!(
        target.registry.read_string(&key, "CreatureMind").unwrap(),
        "M1.mind"
    );
    assert_eq!(
        target.registry.value(&key.join("Stats"), "Level"),
        Some(RegData::Binary(b"new".to_vec()))
    );
    assert_eq!(
        target
            .registry
            .value(&locator.profiles_base_key(), "LastProfile"),
        Some(RegData::Binary(encode_profile_marker("Save1")))
    );
    assert!(!target.workspace_dir().exists());
}

#[test]
fn test_declined_collision_changes_nothing() {
    let (_source, archive) = make_archive();
    let target = Machine::new();
    target.install_profile("Save1", "M1.mind", &[("profile.dat", b"old profile")], b"old");
    let files_before = tree(&target.game_dir());
    let registry_before = target.registry.snapshot();

    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(["n"]);
    let run = restore.run(&archive, &mut prompt).unwrap();

    assert_eq!(
        run.outcome,
        Outcome::Declined {
            at: StageId::CheckCollision
        }
    );
    assert_eq!(prompt.asked, vec![target.messages.profile_exists.prompt.clone()]);
    assert_eq!(tree(&target.game_dir()), files_before);
    assert_eq!(target.registry.snapshot(), registry_before);
    assert!(!target.workspace_dir().exists());
}

#[test]
fn test_confirmed_overwrite_replaces_live_state() {
    let (source, archive) = make_archive();
    let target = Machine::new();
    target.install_profile(
        "Save1",
        "M1.mind",
        &[("profile.dat", b"old profile"), ("only_old.dat", b"stale")],
        b"old",
    );
    target.registry.set_value(
        &target.locator().profile_key("Save1"),
        "OnlyOld",
        RegData::String("stale".into()),
    );

    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(["y"]);
    let run = restore.run(&archive, &mut prompt).unwrap();

    assert_eq!(run.outcome, Outcome::Completed);
    assert_eq!(
        tree(&target.profile_dir("Save1")),
        tree(&source.profile_dir("Save1"))
    );
    assert_eq!(fs::read(target.creature_file("M1.mind")).unwrap(), b"mind:new");

    let key = locator.profile_key("Save1");
    assert!(target.registry.value(&key, "OnlyOld").is_none());
    assert_eq!(
        target.registry.value(&key.join("Stats"), "Level"),
        Some(RegData::Binary(b"new".to_vec()))
    );

    assert!(displaced_leftovers(&target.game_dir().join("Profiles")).is_empty());
    assert!(displaced_leftovers(&target.game_dir().join("Creatures")).is_empty());
    assert!(!target.workspace_dir().exists());
}

#[test]
fn test_failure_after_purge_rolls_back() {
    let target = Machine::new();
    target.install_profile("Save1", "M1.mind", &[("profile.dat", b"old profile")], b"old");
    let files_before = tree(&target.game_dir());
    let registry_before = target.registry.snapshot();
    let locator = target.locator();

    // Archive without the physique file: fails after the live state was moved
    // aside, the registry key removed and the first items copied in.
    let archive = target.dir.path().join("broken.zip");
    {
        let ws = Workspace::create(target.dir.path().join("craft")).unwrap();
        fs::create_dir_all(ws.join("Save1")).unwrap();
        fs::write(ws.join("Save1").join("profile.dat"), b"new profile").unwrap();
        fs::write(ws.join("M1.mind"), b"mind:new").unwrap();

        let donor = MemoryRegistry::new();
        let key = locator.profile_key("Save1");
        donor.set_value(&key, "CreatureMind", RegData::String("M1.mind".into()));
        donor.export_key(&key, &ws.join("profile.reg")).unwrap();

        let manifest = Manifest {
            profile_name: "Save1".into(),
            mind_filename: "M1.mind".into(),
            physique_filename: "M1.phy".into(),
        };
        archiver::write_manifest(&ws, "backup_info.json", &manifest).unwrap();
        archiver::pack(&ws, &archive, ExistingArchive::Refuse).unwrap();
        ws.destroy().unwrap();
    }

    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Granted);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    let failure = restore.run(&archive, &mut prompt).unwrap_err();

    assert_eq!(failure.stage, StageId::RestorePhysique);
    assert!(failure.error.is_not_found());
    assert!(failure.cleanup_errors.is_empty());
    assert!(failure.completed.contains(&StageId::PurgeLive));
    assert!(failure.completed.contains(&StageId::RestoreMind));

    assert_eq!(tree(&target.game_dir()), files_before);
    assert_eq!(target.registry.snapshot(), registry_before);
    assert!(displaced_leftovers(&target.game_dir().join("Profiles")).is_empty());
    assert!(displaced_leftovers(&target.game_dir().join("Creatures")).is_empty());
    assert!(!target.workspace_dir().exists());
}

#[test]
fn test_registry_export_for_another_profile_is_rejected() {
    // Back up Save2, then relabel the archive as Save1 without touching the
    // exported registry key.
    let source = Machine::new();
    source.install_profile("Save2", "M1.mind", &[("profile.dat", b"new")], b"new");
    let source_locator = source.locator();
    let profile = source_locator.resolve_profile("Save2").unwrap();
    BackupOrchestrator::new(&source_locator, &source.messages, Consent::Ask)
        .run(&profile, &source.out_dir(), &mut ScriptedPrompt::new(Vec::<String>::new()))
        .unwrap();

    let relabelled = source.dir.path().join("relabelled.zip");
    {
        let ws = Workspace::create(source.dir.path().join("relabel")).unwrap();
        archiver::unpack(&source.out_dir().join("Save2.zip"), &ws).unwrap();
        fs::rename(ws.join("Save2"), ws.join("Save1")).unwrap();
        let manifest = Manifest {
            profile_name: "Save1".into(),
            mind_filename: "M1.mind".into(),
            physique_filename: "M1.phy".into(),
        };
        archiver::write_manifest(&ws, "backup_info.json", &manifest).unwrap();
        archiver::pack(&ws, &relabelled, ExistingArchive::Refuse).unwrap();
        ws.destroy().unwrap();
    }

    let target = Machine::new();
    target.install_profile("Save2", "M2.mind", &[("profile.dat", b"old2")], b"old2");
    let files_before = tree(&target.game_dir());
    let registry_before = target.registry.snapshot();

    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    let failure = restore.run(&relabelled, &mut prompt).unwrap_err();

    assert_eq!(failure.stage, StageId::ResolvePaths);
    assert!(matches!(failure.error, SaveError::Validation(_)));
    assert!(prompt.asked.is_empty());
    assert_eq!(tree(&target.game_dir()), files_before);
    assert_eq!(target.registry.snapshot(), registry_before);
    assert!(!target.registry.key_exists(&locator.profile_key("Save1")));
    assert!(!target.workspace_dir().exists());
}

#[test]
fn test_archive_without_registry_export_fails_before_any_change() {
    let target = Machine::new();
    target.install_profile("Save1", "M1.mind", &[("profile.dat", b"old profile")], b"old");
    let files_before = tree(&target.game_dir());
    let registry_before = target.registry.snapshot();

    let archive = target.dir.path().join("noreg.zip");
    {
        let ws = Workspace::create(target.dir.path().join("craft")).unwrap();
        fs::create_dir_all(ws.join("Save1")).unwrap();
        fs::write(ws.join("M1.mind"), b"mind:new").unwrap();
        fs::write(ws.join("M1.phy"), b"phy:new").unwrap();
        let manifest = Manifest {
            profile_name: "Save1".into(),
            mind_filename: "M1.mind".into(),
            physique_filename: "M1.phy".into(),
        };
        archiver::write_manifest(&ws, "backup_info.json", &manifest).unwrap();
        archiver::pack(&ws, &archive, ExistingArchive::Refuse).unwrap();
        ws.destroy().unwrap();
    }

    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Granted);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    let failure = restore.run(&archive, &mut prompt).unwrap_err();

    assert_eq!(failure.stage, StageId::ResolvePaths);
    assert!(failure.error.is_not_found());
    assert!(!failure.completed.contains(&StageId::PurgeLive));
    assert_eq!(tree(&target.game_dir()), files_before);
    assert_eq!(target.registry.snapshot(), registry_before);
}

#[test]
fn test_leftover_displaced_copy_is_kept() {
    let (_source, archive) = make_archive();
    let target = Machine::new();
    target.install_profile("Save1", "M1.mind", &[("profile.dat", b"old profile")], b"old");
    let leftover = target.game_dir().join("Profiles").join("Save1.bwsave-displaced");
    fs::create_dir_all(&leftover).unwrap();
    fs::write(leftover.join("profile.dat"), b"older profile").unwrap();
    let files_before = tree(&target.game_dir());
    let registry_before = target.registry.snapshot();

    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Granted);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    let failure = restore.run(&archive, &mut prompt).unwrap_err();

    assert_eq!(failure.stage, StageId::PurgeLive);
    assert!(failure.error.is_collision());
    assert_eq!(tree(&target.game_dir()), files_before);
    assert_eq!(target.registry.snapshot(), registry_before);
    assert_eq!(
        fs::read(leftover.join("profile.dat")).unwrap(),
        b"older profile"
    );
}

#[test]
fn test_missing_archive_fails_at_unpack() {
    let target = Machine::new();
    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

    let failure = restore
        .run(&target.dir.path().join("absent.zip"), &mut prompt)
        .unwrap_err();
    assert_eq!(failure.stage, StageId::UnpackArchive);
    assert!(failure.error.is_not_found());
    assert!(!target.workspace_dir().exists());
}

#[test]
fn test_unsafe_manifest_names_are_rejected_before_any_change() {
    let target = Machine::new();
    let registry_before = target.registry.snapshot();

    let archive = target.dir.path().join("evil.zip");
    {
        let ws = Workspace::create(target.dir.path().join("craft")).unwrap();
        let manifest = Manifest {
            profile_name: "..".into(),
            mind_filename: "M1.mind".into(),
            physique_filename: "M1.phy".into(),
        };
        archiver::write_manifest(&ws, "backup_info.json", &manifest).unwrap();
        archiver::pack(&ws, &archive, ExistingArchive::Refuse).unwrap();
        ws.destroy().unwrap();
    }

    let locator = target.locator();
    let restore = RestoreOrchestrator::new(&locator, &target.messages, Consent::Granted);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    let failure = restore.run(&archive, &mut prompt).unwrap_err();

    assert_eq!(failure.stage, StageId::ReadManifest);
    assert_eq!(target.registry.snapshot(), registry_before);
}
