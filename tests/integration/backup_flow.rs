//! Integration tests for the backup pipeline

use std::fs::{self, File};
use std::io::Read;

use super::common::machine::Machine;
use bwsave::backup::{archiver, BackupOrchestrator, Consent, Outcome, StageId, Workspace};
use bwsave::prompt::ScriptedPrompt;
use pretty_assertions::assert_eq;

#[test]
fn test_clean_backup_produces_complete_archive() {
    let machine = Machine::new();
    machine.install_profile(
        "Save1",
        "M1.mind",
        &[("profile.dat", b"profile"), ("Land1/town.dat", b"town")],
        b"1",
    );
    let locator = machine.locator();
    let profile = locator.resolve_profile("Save1").unwrap();
    assert_eq!(profile.physique_file(), "M1.phy");

    let backup = BackupOrchestrator::new(&locator, &machine.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    let output = locator.output_dir().unwrap();
    let run = backup.run(&profile, &output, &mut prompt).unwrap();

    assert_eq!(run.outcome, Outcome::Completed);
    assert_eq!(run.completed.last(), Some(&StageId::RemoveWorkspace));
    assert!(prompt.asked.is_empty());

    let archive = machine.out_dir().join("Save1.zip");
    assert_eq!(
        archiver::list_entries(&archive).unwrap(),
        vec![
            "M1.mind",
            "M1.phy",
            "Save1/",
            "Save1/Land1/",
            "Save1/Land1/town.dat",
            "Save1/profile.dat",
            "backup_info.json",
            "profile.reg",
        ]
    );

    let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let mut manifest = String::new();
    zip.by_name("backup_info.json")
        .unwrap()
        .read_to_string(&mut manifest)
        .unwrap();
    assert_eq!(
        manifest,
        r#"{"backup_profile":"Save1","creature_mind":"M1.mind","creature_physique":"M1.phy"}"#
    );

    assert!(!machine.workspace_dir().exists());
}

#[test]
fn test_missing_mind_file_fails_without_archive() {
    let machine = Machine::new();
    machine.install_profile("Save1", "M1.mind", &[("profile.dat", b"p")], b"1");
    fs::remove_file(machine.creature_file("M1.mind")).unwrap();

    let locator = machine.locator();
    let profile = locator.resolve_profile("Save1").unwrap();
    let backup = BackupOrchestrator::new(&locator, &machine.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

    let failure = backup
        .run(&profile, &machine.out_dir(), &mut prompt)
        .unwrap_err();
    assert_eq!(failure.stage, StageId::CopyMind);
    assert!(failure.error.is_not_found());
    assert_eq!(
        failure.completed,
        vec![
            StageId::CreateWorkspace,
            StageId::ResolvePaths,
            StageId::CopyProfile
        ]
    );
    assert!(!machine.out_dir().join("Save1.zip").exists());
    assert!(!machine.workspace_dir().exists());
}

#[test]
fn test_stale_workspace_is_replaced() {
    let machine = Machine::new();
    machine.install_profile("Save1", "M1.mind", &[("profile.dat", b"p")], b"1");
    fs::create_dir_all(machine.workspace_dir().join("junk")).unwrap();
    fs::write(machine.workspace_dir().join("junk").join("old.txt"), b"old").unwrap();

    let locator = machine.locator();
    let profile = locator.resolve_profile("Save1").unwrap();
    let backup = BackupOrchestrator::new(&locator, &machine.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());
    backup.run(&profile, &machine.out_dir(), &mut prompt).unwrap();

    let entries = archiver::list_entries(&machine.out_dir().join("Save1.zip")).unwrap();
    assert!(entries.iter().all(|e| !e.starts_with("junk")));
    assert!(!machine.workspace_dir().exists());
}

#[test]
fn test_overwrite_prompt_reprompts_until_answered() {
    let machine = Machine::new();
    machine.install_profile("Save1", "M1.mind", &[("profile.dat", b"p")], b"1");
    fs::write(machine.out_dir().join("Save1.zip"), b"old").unwrap();

    let locator = machine.locator();
    let profile = locator.resolve_profile("Save1").unwrap();
    let backup = BackupOrchestrator::new(&locator, &machine.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(["", "perhaps", "yes"]);

    let run = backup.run(&profile, &machine.out_dir(), &mut prompt).unwrap();
    assert_eq!(run.outcome, Outcome::Completed);
    assert_eq!(prompt.asked.len(), 3);
    assert!(archiver::list_entries(&machine.out_dir().join("Save1.zip")).is_ok());
}

#[test]
fn test_backup_refused_while_workspace_is_held() {
    let machine = Machine::new();
    machine.install_profile("Save1", "M1.mind", &[("profile.dat", b"p")], b"1");
    let held = Workspace::create(machine.workspace_dir()).unwrap();
    std::fs::write(held.join("marker"), b"in use").unwrap();

    let locator = machine.locator();
    let profile = locator.resolve_profile("Save1").unwrap();
    let backup = BackupOrchestrator::new(&locator, &machine.messages, Consent::Ask);
    let mut prompt = ScriptedPrompt::new(Vec::<String>::new());

    let failure = backup
        .run(&profile, &machine.out_dir(), &mut prompt)
        .unwrap_err();
    assert_eq!(failure.stage, StageId::CreateWorkspace);
    assert!(failure.error.is_collision());
    assert!(failure.completed.is_empty());
    assert_eq!(fs::read(held.join("marker")).unwrap(), b"in use");
    assert!(!machine.out_dir().join("Save1.zip").exists());

    held.destroy().unwrap();
}
